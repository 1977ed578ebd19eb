use servicelb_core::ServicePort;
use std::net::AddrParseError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Kubernetes error: {0}")]
    KubernetesError(#[from] kube::Error),

    #[error("No valid node address found for node {0}")]
    NoValidNodeAddress(String),

    #[error("Invalid endpoint address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddrParseError,
    },

    #[error("Invalid port number: {0}")]
    InvalidPort(i32),

    #[error("Service port {0} not found in service spec")]
    ServicePortNotFound(ServicePort),
}
