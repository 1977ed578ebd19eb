//! Service status publishing
//!
//! Every managed Service gets the same statically configured ingress list.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{LoadBalancerIngress, Service};
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use servicelb_api::IngressAddress;
use servicelb_core::ServiceKey;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Trait abstracting Service status writes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    /// Set `status.loadBalancer.ingress` of the Service
    async fn publish(&self, key: &ServiceKey, ingress: &[LoadBalancerIngress]) -> Result<(), kube::Error>;
}

/// StatusPublisher writing through the Kubernetes API
pub struct KubeStatusPublisher {
    client: Client,
    field_manager: String,
}

impl KubeStatusPublisher {
    pub fn new(client: Client, field_manager: &str) -> Self {
        Self {
            client,
            field_manager: field_manager.to_string(),
        }
    }
}

#[async_trait]
impl StatusPublisher for KubeStatusPublisher {
    async fn publish(&self, key: &ServiceKey, ingress: &[LoadBalancerIngress]) -> Result<(), kube::Error> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), &key.namespace);

        let status_patch = serde_json::json!({
            "status": {
                "loadBalancer": {
                    "ingress": ingress
                }
            }
        });
        let params = PatchParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        };

        services
            .patch_status(&key.name, &params, &Patch::Merge(&status_patch))
            .await?;

        debug!(service = %key, entries = ingress.len(), "Updated load balancer status");
        Ok(())
    }
}

/// Render configured ingress addresses as status entries (IP xor hostname)
pub fn ingress_status(addresses: &[IngressAddress]) -> Vec<LoadBalancerIngress> {
    addresses
        .iter()
        .map(|addr| match addr {
            IngressAddress::Ip(ip) => LoadBalancerIngress {
                ip: Some(ip.to_string()),
                ..Default::default()
            },
            IngressAddress::Hostname(host) => LoadBalancerIngress {
                hostname: Some(host.clone()),
                ..Default::default()
            },
        })
        .collect()
}

/// Ingress entries currently present on the Service status
pub fn current_ingress(service: &Service) -> Vec<LoadBalancerIngress> {
    service
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.clone())
        .unwrap_or_default()
}
