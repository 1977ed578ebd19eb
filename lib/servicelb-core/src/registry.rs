//! Exposure registry: which Service owns which claimed port

use crate::{CoreError, Result, ServiceData, ServiceKey, ServicePort};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error};

/// ExposureRegistry holds the committed exposure plan.
///
/// The owners map, the port ownership index and the version counter live
/// behind a single lock so every operation is atomic with respect to the
/// others. Operations never await while holding the lock.
pub struct ExposureRegistry {
    state: RwLock<RegistryState>,
    version_tx: watch::Sender<u64>,
}

#[derive(Default)]
struct RegistryState {
    owners: HashMap<ServiceKey, Arc<ServiceData>>,
    // Derived from `owners`: exactly the ports of every stored ServiceData
    port_owners: HashMap<ServicePort, ServiceKey>,
    version: u64,
}

/// Point-in-time copy of the committed plan
#[derive(Clone, Debug, Default)]
pub struct RegistrySnapshot {
    pub version: u64,
    pub services: BTreeMap<ServiceKey, Arc<ServiceData>>,
}

impl ExposureRegistry {
    pub fn new() -> Self {
        let (version_tx, _) = watch::channel(0);
        Self {
            state: RwLock::new(RegistryState::default()),
            version_tx,
        }
    }

    /// Check whether `port` is claimed by a Service other than `owner`.
    ///
    /// This is only a probe used to skip expensive work; it reserves nothing.
    pub async fn conflicts(&self, owner: &ServiceKey, port: &ServicePort) -> bool {
        let state = self.state.read().await;
        matches!(state.port_owners.get(port), Some(current) if current != owner)
    }

    /// Replace the exposure data of `owner`.
    ///
    /// Rejected without any mutation if a port in `data` is owned by another
    /// Service. Callers probe with [`conflicts`](Self::conflicts) first, so a
    /// rejection here means two reconciliations raced for the same port.
    pub async fn update_service(&self, owner: &ServiceKey, data: ServiceData) -> Result<()> {
        let mut state = self.state.write().await;

        for port in data.claimed_ports() {
            if let Some(current) = state.port_owners.get(port) {
                if current != owner {
                    error!(
                        port = %port,
                        owner = %current,
                        requester = %owner,
                        "Port conflict detected at commit time, rejecting update"
                    );
                    return Err(CoreError::PortConflict {
                        port: *port,
                        owner: current.clone(),
                        requester: owner.clone(),
                    });
                }
            }
        }

        if let Some(previous) = state.owners.get(owner).cloned() {
            for port in previous.claimed_ports() {
                if !data.ports.contains_key(port) {
                    state.port_owners.remove(port);
                }
            }
        }

        for port in data.claimed_ports() {
            state.port_owners.insert(*port, owner.clone());
        }

        let port_count = data.ports.len();
        state.owners.insert(owner.clone(), Arc::new(data));
        state.version += 1;
        self.version_tx.send_replace(state.version);

        debug!(
            service = %owner,
            ports = port_count,
            version = state.version,
            "Updated service exposure"
        );
        Ok(())
    }

    /// Remove `owner` and release its ports. Returns whether anything was removed.
    pub async fn remove_service(&self, owner: &ServiceKey) -> bool {
        let mut state = self.state.write().await;

        let Some(previous) = state.owners.remove(owner) else {
            return false;
        };

        for port in previous.claimed_ports() {
            if state.port_owners.get(port) == Some(owner) {
                state.port_owners.remove(port);
            }
        }

        state.version += 1;
        self.version_tx.send_replace(state.version);

        debug!(service = %owner, version = state.version, "Removed service exposure");
        true
    }

    /// Copy of every committed (owner, data) pair with the matching version
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.read().await;
        RegistrySnapshot {
            version: state.version,
            services: state
                .owners
                .iter()
                .map(|(key, data)| (key.clone(), data.clone()))
                .collect(),
        }
    }

    /// Get the committed data of a single Service
    pub async fn service(&self, owner: &ServiceKey) -> Option<Arc<ServiceData>> {
        let state = self.state.read().await;
        state.owners.get(owner).cloned()
    }

    /// Get the current owner of a claimed port
    pub async fn owner_of(&self, port: &ServicePort) -> Option<ServiceKey> {
        let state = self.state.read().await;
        state.port_owners.get(port).cloned()
    }

    /// Keys of every managed Service
    pub async fn service_keys(&self) -> Vec<ServiceKey> {
        let state = self.state.read().await;
        state.owners.keys().cloned().collect()
    }

    pub async fn version(&self) -> u64 {
        self.state.read().await.version
    }

    /// Get count of managed services
    pub async fn len(&self) -> usize {
        self.state.read().await.owners.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Receiver notified with the new version after every commit or removal
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version_tx.subscribe()
    }
}

impl Default for ExposureRegistry {
    fn default() -> Self {
        Self::new()
    }
}
