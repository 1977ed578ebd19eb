//! Read access to the cluster objects endpoint resolution depends on

use crate::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Service};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use kube::api::{Api, ListParams};
use kube::Client;
use servicelb_api::annotations::SERVICE_NAME_LABEL;
use servicelb_core::ServiceKey;

#[cfg(test)]
use mockall::automock;

/// Trait abstracting cluster reads
///
/// Lets the resolver and the controller run against an in-memory cluster in
/// tests while production goes through the Kubernetes API. Calls may block on
/// network I/O and must never be made while holding registry state.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterReader: Send + Sync {
    /// Get a Service by key, `None` if it does not exist
    async fn get_service(&self, key: &ServiceKey) -> Result<Option<Service>>;

    /// List the EndpointSlices labeled for the Service in its namespace
    async fn list_endpoint_slices(&self, key: &ServiceKey) -> Result<Vec<EndpointSlice>>;

    /// Get a Node by name, `None` if it does not exist
    async fn get_node(&self, name: &str) -> Result<Option<Node>>;
}

/// ClusterReader backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeClusterReader {
    client: Client,
}

impl KubeClusterReader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterReader for KubeClusterReader {
    async fn get_service(&self, key: &ServiceKey) -> Result<Option<Service>> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(services.get_opt(&key.name).await?)
    }

    async fn list_endpoint_slices(&self, key: &ServiceKey) -> Result<Vec<EndpointSlice>> {
        let slices: Api<EndpointSlice> = Api::namespaced(self.client.clone(), &key.namespace);
        let params = ListParams::default().labels(&format!("{}={}", SERVICE_NAME_LABEL, key.name));
        let list = slices.list(&params).await?;
        Ok(list.items)
    }

    async fn get_node(&self, name: &str) -> Result<Option<Node>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        Ok(nodes.get_opt(name).await?)
    }
}
