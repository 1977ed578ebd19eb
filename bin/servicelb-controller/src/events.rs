//! Kubernetes Event recording
//!
//! Events are fire-and-forget: failures are logged and never fail a
//! reconciliation.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use tracing::warn;

#[cfg(test)]
use mockall::automock;

/// Trait for publishing Kubernetes Events on a resource
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    );
}

/// EventPublisher backed by `kube::runtime::events::Recorder`
pub struct KubeEventPublisher {
    client: Client,
    reporter: Reporter,
}

impl KubeEventPublisher {
    /// The controller name appears as the reporting component of every Event
    pub fn new(client: Client, controller_name: &str) -> Self {
        Self {
            client,
            reporter: Reporter {
                controller: controller_name.to_string(),
                instance: std::env::var("POD_NAME").ok(),
            },
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        let recorder = Recorder::new(
            self.client.clone(),
            self.reporter.clone(),
            resource_ref.clone(),
        );
        let event = Event {
            type_,
            reason: reason.to_string(),
            note,
            action: action.to_string(),
            secondary: None,
        };

        if let Err(e) = recorder.publish(event).await {
            warn!(reason, action, error = %e, "Failed to publish Kubernetes event");
        }
    }
}

/// Event reason strings
pub mod reasons {
    /// A requested port is already owned by another Service
    pub const CONFLICT: &str = "Conflict";
}

/// Event action strings
pub mod actions {
    pub const RECONCILE: &str = "Reconcile";
}
