use servicelb_core::CoreError;
use servicelb_discovery::DiscoveryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kubernetes error: {0}")]
    KubernetesError(#[from] kube::Error),

    #[error("Endpoint discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Registry rejected update: {0}")]
    Registry(#[from] CoreError),

    #[error("Invalid annotation {key}={value:?}: {source}")]
    InvalidAnnotation {
        key: &'static str,
        value: String,
        #[source]
        source: CoreError,
    },

    #[error("Invalid load balancer source range: {0:?}")]
    InvalidSourceRange(String),

    #[error("Service is missing {0}")]
    MissingMetadata(&'static str),
}
