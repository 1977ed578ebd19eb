use crate::{ServiceKey, ServicePort};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    #[error("Port {port} requested by {requester} is already owned by {owner}")]
    PortConflict {
        port: ServicePort,
        owner: ServiceKey,
        requester: ServiceKey,
    },

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
}
