//! Gathering the cluster state needed to resolve one Service

use crate::resolver::slice_matches_family;
use crate::{ClusterReader, Result};
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::discovery::v1::EndpointSlice;
use servicelb_api::{AddressSource, ResolverConfig};
use servicelb_core::ServiceKey;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// EndpointSlices of one Service plus the Nodes they reference
#[derive(Clone, Debug, Default)]
pub struct ClusterSnapshot {
    pub endpoint_slices: Vec<EndpointSlice>,
    pub nodes: HashMap<String, Node>,
}

impl ClusterSnapshot {
    pub fn new(endpoint_slices: Vec<EndpointSlice>) -> Self {
        Self {
            endpoint_slices,
            nodes: HashMap::new(),
        }
    }

    /// Add a node, keyed by its name
    pub fn with_node(mut self, node: Node) -> Self {
        if let Some(name) = node.metadata.name.clone() {
            self.nodes.insert(name, node);
        }
        self
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Read the slices of `key` and, in Node mode, every Node they reference.
    ///
    /// Slice listing errors are returned. A Node that cannot be read is left
    /// out of the snapshot so only the endpoints on it are lost.
    pub async fn fetch<R>(reader: &R, key: &ServiceKey, config: &ResolverConfig) -> Result<Self>
    where
        R: ClusterReader + ?Sized,
    {
        let endpoint_slices = reader.list_endpoint_slices(key).await?;
        debug!(
            service = %key,
            slices = endpoint_slices.len(),
            "Listed endpoint slices"
        );

        let mut snapshot = Self::new(endpoint_slices);
        if config.address_source != AddressSource::Node {
            return Ok(snapshot);
        }

        let node_names: BTreeSet<String> = snapshot
            .endpoint_slices
            .iter()
            .filter(|slice| slice_matches_family(slice, config.use_ipv6))
            .flat_map(|slice| slice.endpoints.iter())
            .filter_map(|ep| ep.node_name.clone())
            .collect();

        for name in node_names {
            match reader.get_node(&name).await {
                Ok(Some(node)) => {
                    snapshot.nodes.insert(name, node);
                }
                Ok(None) => debug!(node = %name, service = %key, "Referenced node not found"),
                Err(e) => warn!(node = %name, service = %key, error = %e, "Failed to read node"),
            }
        }

        Ok(snapshot)
    }
}
