//! Configuration and API contract for the servicelb controller
//!
//! This library defines:
//! - ControllerConfig: process configuration (accepted class, address source, ingress status)
//! - Well-known annotation and label keys read from Services and EndpointSlices

pub mod annotations;
pub mod config;

pub use config::{AddressSource, ConfigError, ControllerConfig, IngressAddress, ResolverConfig};
