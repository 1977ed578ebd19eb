//! Endpoint discovery from Kubernetes cluster state
pub mod client;
pub mod discovery;
pub mod error;
pub mod resolver;

pub use client::{ClusterReader, KubeClusterReader};
pub use discovery::ClusterSnapshot;
pub use error::{DiscoveryError, Result};
pub use resolver::{select_node_address, EndpointResolver};
