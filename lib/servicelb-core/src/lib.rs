//! Core exposure plan functionality
//!
//! This library provides:
//! - The exposure data model (claimed ports, resolved endpoints, per-port policy)
//! - ExposureRegistry: the conflict-free mapping from claimed ports to owning Services
//! - Parsing of duration strings used in Service annotations

pub mod duration;
pub mod endpoint;
pub mod error;
pub mod registry;

pub use duration::parse_duration;
pub use endpoint::{
    Protocol, ServiceData, ServiceEndpoint, ServiceKey, ServicePort, ServicePortData,
};
pub use error::{CoreError, Result};
pub use registry::{ExposureRegistry, RegistrySnapshot};
