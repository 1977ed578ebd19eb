//! Service controller: turns LoadBalancer Services into committed exposure entries
//!
//! Each reconciliation re-reads the Service, probes the registry for port
//! conflicts, resolves endpoints for every accepted port and commits the
//! complete ServiceData in one step. Cluster reads happen before the commit
//! so the registry is never held across network I/O.

use crate::error::Error;
use crate::events::{actions, reasons, EventPublisher};
use crate::locks::KeyLocks;
use crate::metrics::{outcome, MetricsCollector};
use crate::status::{current_ingress, ingress_status, StatusPublisher};
use futures::StreamExt;
use ipnetwork::IpNetwork;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::discovery::v1::EndpointSlice;
use kube::runtime::events::EventType;
use kube::{Api, Client, Resource, ResourceExt};
use kube_runtime::controller::{Action, Controller};
use kube_runtime::reflector::ObjectRef;
use kube_runtime::watcher::{self, Event};
use kube_runtime::WatchStreamExt;
use servicelb_api::annotations::{IDLE_TIMEOUT, PROXY_PROTOCOL, SERVICE_NAME_LABEL};
use servicelb_api::ControllerConfig;
use servicelb_core::{
    parse_duration, ExposureRegistry, Protocol, ServiceData, ServiceKey, ServicePort,
    ServicePortData,
};
use servicelb_discovery::{ClusterReader, ClusterSnapshot, EndpointResolver};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Retry delay after a Service was refused because of a conflicting port
pub const CONFLICT_REQUEUE: Duration = Duration::from_secs(60);

/// Retry delay after a failed reconciliation
pub const ERROR_REQUEUE: Duration = Duration::from_secs(60);

/// Shared state of all reconciliations
pub struct Context {
    pub reader: Arc<dyn ClusterReader>,
    pub registry: Arc<ExposureRegistry>,
    pub status: Arc<dyn StatusPublisher>,
    pub events: Arc<dyn EventPublisher>,
    pub resolver: EndpointResolver,
    pub config: Arc<ControllerConfig>,
    pub metrics: MetricsCollector,
    pub locks: KeyLocks,
}

pub fn service_key(service: &Service) -> Result<ServiceKey, Error> {
    let name = service
        .metadata
        .name
        .as_deref()
        .ok_or(Error::MissingMetadata("name"))?;
    let namespace = service
        .metadata
        .namespace
        .as_deref()
        .ok_or(Error::MissingMetadata("namespace"))?;
    Ok(ServiceKey::new(namespace, name))
}

/// A Service is managed iff it is of type LoadBalancer and its class
/// (empty when unset) equals the accepted class
pub fn should_manage(service: &Service, accepted_class: &str) -> bool {
    let Some(spec) = service.spec.as_ref() else {
        return false;
    };
    if spec.type_.as_deref() != Some("LoadBalancer") {
        return false;
    }
    spec.load_balancer_class.as_deref().unwrap_or_default() == accepted_class
}

/// TCP and UDP ports of the Service; other protocols are dropped
pub fn service_ports(service: &Service) -> Vec<ServicePort> {
    let Some(ports) = service.spec.as_ref().and_then(|s| s.ports.as_ref()) else {
        return Vec::new();
    };

    let mut accepted: Vec<ServicePort> = ports
        .iter()
        .filter_map(|p| {
            let protocol = Protocol::from_k8s(p.protocol.as_deref().unwrap_or("TCP"))?;
            let port = u16::try_from(p.port).ok()?;
            Some(ServicePort::new(port, protocol))
        })
        .collect();
    accepted.sort();
    accepted.dedup();
    accepted
}

/// Map an EndpointSlice to the Service named by its service-name label
pub fn service_for_endpoint_slice(slice: EndpointSlice) -> Option<ObjectRef<Service>> {
    let name = slice.labels().get(SERVICE_NAME_LABEL)?;
    let namespace = slice.namespace()?;
    Some(ObjectRef::new(name).within(&namespace))
}

pub async fn reconcile(service: Arc<Service>, ctx: Arc<Context>) -> Result<Action, Error> {
    let key = service_key(&service)?;
    reconcile_key(&key, &ctx).await
}

pub fn error_policy(service: Arc<Service>, error: &Error, ctx: Arc<Context>) -> Action {
    error!(
        service = %service.name_any(),
        namespace = ?service.namespace(),
        error = %error,
        "Reconciliation failed"
    );
    ctx.metrics.record_outcome(outcome::ERROR);
    Action::requeue(ERROR_REQUEUE)
}

/// Reconcile the Service identified by `key` against the registry.
///
/// Passes for the same key never overlap, whether they come from the
/// controller queue or the deletion watcher.
pub async fn reconcile_key(key: &ServiceKey, ctx: &Context) -> Result<Action, Error> {
    let _guard = ctx.locks.lock(key).await;
    reconcile_locked(key, ctx).await
}

async fn reconcile_locked(key: &ServiceKey, ctx: &Context) -> Result<Action, Error> {
    let Some(service) = ctx.reader.get_service(key).await? else {
        if ctx.registry.remove_service(key).await {
            info!(service = %key, "Service deleted, released its ports");
            ctx.metrics.observe_registry(&ctx.registry).await;
        }
        ctx.metrics.record_outcome(outcome::REMOVED);
        return Ok(Action::await_change());
    };

    if !should_manage(&service, &ctx.config.load_balancer_class) {
        debug!(service = %key, "Service not managed by this controller");
        ctx.metrics.record_outcome(outcome::IGNORED);
        return Ok(Action::await_change());
    }

    let ports = service_ports(&service);

    for port in &ports {
        if ctx.registry.conflicts(key, port).await {
            warn!(service = %key, %port, "Port already owned by another service");
            ctx.events
                .publish(
                    &service.object_ref(&()),
                    EventType::Warning,
                    reasons::CONFLICT,
                    actions::RECONCILE,
                    Some(format!(
                        "Service could not be allocated due to a conflicting port {}",
                        port
                    )),
                )
                .await;
            ctx.metrics.port_conflicts_total.inc();
            ctx.metrics.record_outcome(outcome::CONFLICT);
            return Ok(Action::requeue(CONFLICT_REQUEUE));
        }
    }

    let data = build_service_data(&service, key, &ports, ctx).await?;
    let endpoints: usize = data.ports.values().map(|p| p.endpoints.len()).sum();

    ctx.registry.update_service(key, data).await?;
    ctx.metrics.observe_registry(&ctx.registry).await;
    info!(service = %key, ports = ports.len(), endpoints, "Committed service exposure");

    let desired = ingress_status(&ctx.config.ingress_status);
    if current_ingress(&service) != desired {
        ctx.status.publish(key, &desired).await?;
    }

    ctx.metrics.record_outcome(outcome::APPLIED);
    Ok(Action::await_change())
}

/// Assemble the complete exposure data of an eligible Service.
///
/// Annotation and source range settings apply to every port. Any parse or
/// resolution failure fails the whole build.
async fn build_service_data(
    service: &Service,
    key: &ServiceKey,
    ports: &[ServicePort],
    ctx: &Context,
) -> Result<ServiceData, Error> {
    let annotations = service.annotations();

    let use_proxy_protocol = annotations.get(PROXY_PROTOCOL).map(String::as_str) == Some("true");

    // An empty value means unset
    let idle_timeout = annotations
        .get(IDLE_TIMEOUT)
        .filter(|value| !value.is_empty())
        .map(|value| {
            parse_duration(value).map_err(|source| Error::InvalidAnnotation {
                key: IDLE_TIMEOUT,
                value: value.clone(),
                source,
            })
        })
        .transpose()?;

    let allowed_ip_ranges = service
        .spec
        .as_ref()
        .and_then(|s| s.load_balancer_source_ranges.as_deref())
        .unwrap_or_default()
        .iter()
        .map(String::as_str)
        .map(parse_source_range)
        .collect::<Result<Vec<_>, _>>()?;

    let snapshot =
        ClusterSnapshot::fetch(ctx.reader.as_ref(), key, ctx.resolver.config()).await?;

    let mut data = ServiceData::new();
    for port in ports {
        let endpoints = ctx.resolver.resolve(service, port, &snapshot)?;
        debug!(service = %key, %port, endpoints = endpoints.len(), "Resolved endpoints");

        data.ports.insert(
            *port,
            ServicePortData {
                endpoints,
                use_proxy_protocol,
                idle_timeout,
                allowed_ip_ranges: allowed_ip_ranges.clone(),
            },
        );
    }

    Ok(data)
}

// Only CIDR notation is accepted; a bare address is rejected
fn parse_source_range(range: &str) -> Result<IpNetwork, Error> {
    if !range.contains('/') {
        return Err(Error::InvalidSourceRange(range.to_string()));
    }
    range
        .parse()
        .map_err(|_| Error::InvalidSourceRange(range.to_string()))
}

/// Run the Service controller until a shutdown signal arrives
pub async fn run(ctx: Arc<Context>, client: Client) {
    info!("Starting Service reconciliation");

    let services: Api<Service> = Api::all(client.clone());
    let slices: Api<EndpointSlice> = Api::all(client);

    Controller::new(services, watcher::Config::default())
        .watches(
            slices,
            watcher::Config::default().labels(SERVICE_NAME_LABEL),
            service_for_endpoint_slice,
        )
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, _)) => debug!(service = %obj, "Reconciled service"),
                Err(e) => warn!(error = %e, "Reconciliation stream error"),
            }
        })
        .await;

    info!("Service controller stopped");
}

/// Release the ports of deleted Services.
///
/// Deleted objects are never handed to the controller, so deletions are
/// taken from a separate watch. After every (re)list, registry entries whose
/// Service was not listed are reconciled too, covering deletions missed
/// while the watch was down.
pub async fn watch_deletions(ctx: Arc<Context>, client: Client) {
    let services: Api<Service> = Api::all(client);
    let mut stream = watcher::watcher(services, watcher::Config::default())
        .default_backoff()
        .boxed();
    let mut relist = RelistTracker::default();

    while let Some(event) = stream.next().await {
        match event {
            Ok(Event::Delete(service)) => {
                let Ok(key) = service_key(&service) else {
                    continue;
                };
                release_if_deleted(&key, &ctx).await;
            }
            Ok(Event::Init) => relist.begin(),
            Ok(Event::InitApply(service)) => {
                if let Ok(key) = service_key(&service) {
                    relist.listed(key);
                }
            }
            Ok(Event::InitDone) => {
                let unlisted = relist.finish(ctx.registry.service_keys().await);
                if !unlisted.is_empty() {
                    info!(count = unlisted.len(), "Reconciling services missing from relist");
                }
                for key in unlisted {
                    release_if_deleted(&key, &ctx).await;
                }
            }
            Ok(Event::Apply(_)) => {}
            Err(e) => warn!(error = %e, "Service deletion watch error"),
        }
    }
}

/// Services seen during one watch (re)list
#[derive(Debug, Default)]
pub struct RelistTracker {
    listed: HashSet<ServiceKey>,
}

impl RelistTracker {
    /// Start a new list, forgetting the previous one
    pub fn begin(&mut self) {
        self.listed.clear();
    }

    pub fn listed(&mut self, key: ServiceKey) {
        self.listed.insert(key);
    }

    /// Complete the list and return the registered keys it did not contain
    pub fn finish(&mut self, registered: impl IntoIterator<Item = ServiceKey>) -> Vec<ServiceKey> {
        let unlisted = registered
            .into_iter()
            .filter(|key| !self.listed.contains(key))
            .collect();
        self.listed.clear();
        unlisted
    }
}

async fn release_if_deleted(key: &ServiceKey, ctx: &Context) {
    if let Err(e) = reconcile_key(key, ctx).await {
        error!(service = %key, error = %e, "Failed to reconcile deleted service");
    }
}
