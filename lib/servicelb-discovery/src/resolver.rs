//! Endpoint resolution: Service port + EndpointSlices + Nodes -> ordered destinations
//!
//! Resolution works on a [`ClusterSnapshot`] and performs no I/O.
//!
//! 1. Only slices of the configured address family are considered
//! 2. The slice port is matched to the Service port by name
//! 3. Endpoint addresses come from the Node (paired with the node port) or the
//!    Pod (paired with the target port)
//! 4. Results are deduplicated by address and port, filtered to ready
//!    endpoints and sorted by address

use crate::{ClusterSnapshot, DiscoveryError, Result};
use k8s_openapi::api::core::v1::{Node, Service, ServicePort as K8sServicePort};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use servicelb_api::{AddressSource, ResolverConfig};
use servicelb_core::{Protocol, ServiceEndpoint, ServicePort};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

/// Resolves the ready endpoints behind a claimed Service port
#[derive(Clone, Debug)]
pub struct EndpointResolver {
    config: ResolverConfig,
}

impl EndpointResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the ordered, deduplicated, ready-only endpoints of `port`.
    ///
    /// An (address, port) pair seen several times is ready if any occurrence
    /// is ready. Endpoints whose node address cannot be resolved are dropped;
    /// a malformed pod address fails the whole resolution.
    pub fn resolve(
        &self,
        service: &Service,
        port: &ServicePort,
        snapshot: &ClusterSnapshot,
    ) -> Result<Vec<ServiceEndpoint>> {
        let svc_port = find_service_port(service, port)
            .ok_or(DiscoveryError::ServicePortNotFound(*port))?;
        let node_port = svc_port.node_port.unwrap_or(0);

        let mut readiness: HashMap<SocketAddr, bool> = HashMap::new();

        for slice in &snapshot.endpoint_slices {
            if !slice_matches_family(slice, self.config.use_ipv6) {
                continue;
            }

            let Some(target_port) = slice_target_port(slice, svc_port) else {
                continue;
            };

            for ep in &slice.endpoints {
                let ready = ep.conditions.as_ref().and_then(|c| c.ready).unwrap_or(true);

                match self.config.address_source {
                    AddressSource::Node => {
                        let Some(node_name) = ep.node_name.as_deref() else {
                            continue;
                        };
                        if node_port == 0 {
                            continue;
                        }

                        let ip = match snapshot
                            .node(node_name)
                            .ok_or_else(|| DiscoveryError::NoValidNodeAddress(node_name.to_string()))
                            .and_then(|node| select_node_address(node, &self.config))
                        {
                            Ok(ip) => ip,
                            Err(e) => {
                                debug!(node = node_name, error = %e, "Dropping endpoint without node address");
                                continue;
                            }
                        };

                        let addr = SocketAddr::new(ip, to_port(node_port)?);
                        *readiness.entry(addr).or_insert(false) |= ready;
                    }
                    AddressSource::Pod => {
                        let target_port = to_port(target_port)?;
                        for address in &ep.addresses {
                            let ip: IpAddr = address.parse().map_err(|source| {
                                DiscoveryError::InvalidAddress {
                                    address: address.clone(),
                                    source,
                                }
                            })?;
                            let addr = SocketAddr::new(ip, target_port);
                            *readiness.entry(addr).or_insert(false) |= ready;
                        }
                    }
                }
            }
        }

        let mut ready: Vec<SocketAddr> = readiness
            .into_iter()
            .filter_map(|(addr, ready)| ready.then_some(addr))
            .collect();
        ready.sort_by_key(|addr| (addr.ip(), addr.port()));

        Ok(ready
            .into_iter()
            .map(|addr| ServiceEndpoint {
                addr,
                protocol: port.protocol,
            })
            .collect())
    }
}

/// Select the first node address of the configured type and family
pub fn select_node_address(node: &Node, config: &ResolverConfig) -> Result<IpAddr> {
    let addresses = node
        .status
        .as_ref()
        .and_then(|s| s.addresses.as_deref())
        .unwrap_or_default();

    for entry in addresses {
        if entry.type_ != config.node_address_type {
            continue;
        }

        let Ok(ip) = entry.address.parse::<IpAddr>() else {
            continue;
        };

        if ip.is_ipv6() == config.use_ipv6 {
            return Ok(ip);
        }
    }

    Err(DiscoveryError::NoValidNodeAddress(
        node.metadata.name.clone().unwrap_or_default(),
    ))
}

pub(crate) fn slice_matches_family(slice: &EndpointSlice, use_ipv6: bool) -> bool {
    match slice.address_type.as_str() {
        "IPv6" => use_ipv6,
        "IPv4" => !use_ipv6,
        _ => false,
    }
}

fn find_service_port<'a>(service: &'a Service, port: &ServicePort) -> Option<&'a K8sServicePort> {
    service
        .spec
        .as_ref()?
        .ports
        .as_ref()?
        .iter()
        .find(|sp| {
            i32::from(port.port) == sp.port
                && Protocol::from_k8s(sp.protocol.as_deref().unwrap_or("TCP")) == Some(port.protocol)
        })
}

/// Numeric target port of the slice port matching `svc_port` by name.
///
/// Returns `None` when the slice carries no matching port, or when it has no
/// number and the Service only knows the target port by name.
fn slice_target_port(slice: &EndpointSlice, svc_port: &K8sServicePort) -> Option<i32> {
    let svc_port_name = svc_port.name.as_deref().unwrap_or_default();
    let slice_port = slice
        .ports
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|p| p.name.as_deref().unwrap_or_default() == svc_port_name)?;

    if let Some(port) = slice_port.port {
        return Some(port);
    }

    match &svc_port.target_port {
        Some(IntOrString::String(_)) => None,
        Some(IntOrString::Int(port)) => Some(*port),
        None => Some(svc_port.port),
    }
}

fn to_port(port: i32) -> Result<u16> {
    u16::try_from(port).map_err(|_| DiscoveryError::InvalidPort(port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{NodeAddress, NodeStatus, ServiceSpec};
    use k8s_openapi::api::discovery::v1::{Endpoint, EndpointConditions, EndpointPort};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    // Helper to create an endpoint with addresses and optional ready condition
    fn make_endpoint(addresses: Vec<&str>, ready: Option<bool>) -> Endpoint {
        Endpoint {
            addresses: addresses.into_iter().map(String::from).collect(),
            conditions: Some(EndpointConditions {
                ready,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn make_node_endpoint(node: &str, ready: Option<bool>) -> Endpoint {
        Endpoint {
            node_name: Some(node.to_string()),
            ..make_endpoint(vec!["10.244.0.10"], ready)
        }
    }

    // Helper to create an endpoint port
    fn make_port(name: Option<&str>, port: Option<i32>) -> EndpointPort {
        EndpointPort {
            name: name.map(String::from),
            port,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }
    }

    fn make_slice(address_type: &str, ports: Vec<EndpointPort>, endpoints: Vec<Endpoint>) -> EndpointSlice {
        EndpointSlice {
            address_type: address_type.to_string(),
            ports: Some(ports),
            endpoints,
            ..Default::default()
        }
    }

    fn make_service(ports: Vec<K8sServicePort>) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some("web".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                type_: Some("LoadBalancer".to_string()),
                ports: Some(ports),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn http_port(target_port: Option<IntOrString>, node_port: Option<i32>) -> K8sServicePort {
        K8sServicePort {
            name: Some("http".to_string()),
            port: 80,
            protocol: Some("TCP".to_string()),
            target_port,
            node_port,
            ..Default::default()
        }
    }

    fn make_node(name: &str, addresses: &[(&str, &str)]) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            status: Some(NodeStatus {
                addresses: Some(
                    addresses
                        .iter()
                        .map(|(type_, address)| NodeAddress {
                            type_: type_.to_string(),
                            address: address.to_string(),
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn pod_config() -> ResolverConfig {
        ResolverConfig {
            address_source: AddressSource::Pod,
            node_address_type: "InternalIP".to_string(),
            use_ipv6: false,
        }
    }

    fn node_config() -> ResolverConfig {
        ResolverConfig {
            address_source: AddressSource::Node,
            ..pod_config()
        }
    }

    fn tcp80() -> ServicePort {
        ServicePort::new(80, Protocol::Tcp)
    }

    fn addrs(endpoints: &[ServiceEndpoint]) -> Vec<String> {
        endpoints.iter().map(|e| e.addr.to_string()).collect()
    }

    // Pod mode

    #[test]
    fn test_resolve_pod_addresses_with_slice_port() {
        let service = make_service(vec![http_port(Some(IntOrString::Int(8080)), None)]);
        let snapshot = ClusterSnapshot::new(vec![make_slice(
            "IPv4",
            vec![make_port(Some("http"), Some(8080))],
            vec![make_endpoint(vec!["10.0.0.2", "10.0.0.1"], Some(true))],
        )]);

        let endpoints = EndpointResolver::new(pod_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        assert_eq!(addrs(&endpoints), vec!["10.0.0.1:8080", "10.0.0.2:8080"]);
        assert!(endpoints.iter().all(|e| e.protocol == Protocol::Tcp));
    }

    #[test]
    fn test_resolve_dedups_mixed_readiness_and_sorts() {
        let service = make_service(vec![http_port(None, None)]);
        let snapshot = ClusterSnapshot::new(vec![
            make_slice(
                "IPv4",
                vec![make_port(Some("http"), Some(8080))],
                vec![
                    make_endpoint(vec!["10.0.0.9"], Some(true)),
                    make_endpoint(vec!["10.0.0.3"], Some(false)),
                    make_endpoint(vec!["10.0.0.5"], Some(false)),
                ],
            ),
            make_slice(
                "IPv4",
                vec![make_port(Some("http"), Some(8080))],
                vec![
                    make_endpoint(vec!["10.0.0.3"], Some(true)),
                    make_endpoint(vec!["10.0.0.9"], Some(false)),
                    make_endpoint(vec!["10.0.0.7"], None),
                    make_endpoint(vec!["10.0.0.7"], Some(true)),
                ],
            ),
        ]);

        let endpoints = EndpointResolver::new(pod_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        // 10.0.0.5 is never ready; the others are ready in at least one slice
        assert_eq!(
            addrs(&endpoints),
            vec!["10.0.0.3:8080", "10.0.0.7:8080", "10.0.0.9:8080"]
        );
    }

    #[test]
    fn test_resolve_readiness_defaults_to_true() {
        let service = make_service(vec![http_port(None, None)]);
        let snapshot = ClusterSnapshot::new(vec![make_slice(
            "IPv4",
            vec![make_port(Some("http"), Some(8080))],
            vec![
                make_endpoint(vec!["10.0.0.1"], None),
                Endpoint {
                    addresses: vec!["10.0.0.2".to_string()],
                    conditions: None,
                    ..Default::default()
                },
            ],
        )]);

        let endpoints = EndpointResolver::new(pod_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        assert_eq!(addrs(&endpoints), vec!["10.0.0.1:8080", "10.0.0.2:8080"]);
    }

    #[test]
    fn test_resolve_orders_by_address_not_text() {
        let service = make_service(vec![http_port(None, None)]);
        let snapshot = ClusterSnapshot::new(vec![make_slice(
            "IPv4",
            vec![make_port(Some("http"), Some(8080))],
            vec![make_endpoint(vec!["10.0.0.10", "10.0.0.9", "9.0.0.1"], Some(true))],
        )]);

        let endpoints = EndpointResolver::new(pod_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        assert_eq!(
            addrs(&endpoints),
            vec!["9.0.0.1:8080", "10.0.0.9:8080", "10.0.0.10:8080"]
        );
    }

    #[test]
    fn test_resolve_ignores_other_address_family() {
        let service = make_service(vec![http_port(None, None)]);
        let slices = vec![
            make_slice(
                "IPv4",
                vec![make_port(Some("http"), Some(8080))],
                vec![make_endpoint(vec!["10.0.0.1"], Some(true))],
            ),
            make_slice(
                "IPv6",
                vec![make_port(Some("http"), Some(8080))],
                vec![make_endpoint(vec!["fd00::1"], Some(true))],
            ),
            make_slice(
                "FQDN",
                vec![make_port(Some("http"), Some(8080))],
                vec![make_endpoint(vec!["backend.example.com"], Some(true))],
            ),
        ];
        let snapshot = ClusterSnapshot::new(slices);

        let v4 = EndpointResolver::new(pod_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();
        assert_eq!(addrs(&v4), vec!["10.0.0.1:8080"]);

        let v6_config = ResolverConfig {
            use_ipv6: true,
            ..pod_config()
        };
        let v6 = EndpointResolver::new(v6_config)
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();
        assert_eq!(addrs(&v6), vec!["[fd00::1]:8080"]);
    }

    #[test]
    fn test_resolve_matches_slice_port_by_name() {
        let service = make_service(vec![http_port(None, None)]);
        let snapshot = ClusterSnapshot::new(vec![
            make_slice(
                "IPv4",
                vec![
                    make_port(Some("metrics"), Some(9100)),
                    make_port(Some("http"), Some(8080)),
                ],
                vec![make_endpoint(vec!["10.0.0.1"], Some(true))],
            ),
            // No port named "http": skipped entirely
            make_slice(
                "IPv4",
                vec![make_port(Some("grpc"), Some(9090))],
                vec![make_endpoint(vec!["10.0.0.2"], Some(true))],
            ),
        ]);

        let endpoints = EndpointResolver::new(pod_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        assert_eq!(addrs(&endpoints), vec!["10.0.0.1:8080"]);
    }

    #[test]
    fn test_resolve_unnamed_ports_match() {
        let unnamed = K8sServicePort {
            name: None,
            ..http_port(None, None)
        };
        let service = make_service(vec![unnamed]);
        let snapshot = ClusterSnapshot::new(vec![
            make_slice(
                "IPv4",
                vec![make_port(None, Some(8080))],
                vec![make_endpoint(vec!["10.0.0.1"], Some(true))],
            ),
            make_slice(
                "IPv4",
                vec![make_port(Some(""), Some(8080))],
                vec![make_endpoint(vec!["10.0.0.2"], Some(true))],
            ),
        ]);

        let endpoints = EndpointResolver::new(pod_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        assert_eq!(addrs(&endpoints), vec!["10.0.0.1:8080", "10.0.0.2:8080"]);
    }

    #[test]
    fn test_resolve_falls_back_to_numeric_target_port() {
        let service = make_service(vec![http_port(Some(IntOrString::Int(8081)), None)]);
        let snapshot = ClusterSnapshot::new(vec![make_slice(
            "IPv4",
            vec![make_port(Some("http"), None)],
            vec![make_endpoint(vec!["10.0.0.1"], Some(true))],
        )]);

        let endpoints = EndpointResolver::new(pod_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        assert_eq!(addrs(&endpoints), vec!["10.0.0.1:8081"]);
    }

    #[test]
    fn test_resolve_skips_slice_when_target_port_is_named() {
        let service = make_service(vec![http_port(
            Some(IntOrString::String("web".to_string())),
            None,
        )]);
        let snapshot = ClusterSnapshot::new(vec![make_slice(
            "IPv4",
            vec![make_port(Some("http"), None)],
            vec![make_endpoint(vec!["10.0.0.1"], Some(true))],
        )]);

        let endpoints = EndpointResolver::new(pod_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        assert!(endpoints.is_empty());
    }

    #[test]
    fn test_resolve_fails_on_malformed_pod_address() {
        let service = make_service(vec![http_port(None, None)]);
        let snapshot = ClusterSnapshot::new(vec![make_slice(
            "IPv4",
            vec![make_port(Some("http"), Some(8080))],
            vec![make_endpoint(vec!["10.0.0.1", "not-an-ip"], Some(true))],
        )]);

        let result = EndpointResolver::new(pod_config()).resolve(&service, &tcp80(), &snapshot);

        assert!(matches!(
            result,
            Err(DiscoveryError::InvalidAddress { ref address, .. }) if address == "not-an-ip"
        ));
    }

    #[test]
    fn test_resolve_fails_on_out_of_range_port() {
        let service = make_service(vec![http_port(None, None)]);
        let snapshot = ClusterSnapshot::new(vec![make_slice(
            "IPv4",
            vec![make_port(Some("http"), Some(70000))],
            vec![make_endpoint(vec!["10.0.0.1"], Some(true))],
        )]);

        let result = EndpointResolver::new(pod_config()).resolve(&service, &tcp80(), &snapshot);

        assert!(matches!(result, Err(DiscoveryError::InvalidPort(70000))));
    }

    #[test]
    fn test_resolve_empty_snapshot_is_not_an_error() {
        let service = make_service(vec![http_port(None, None)]);

        let endpoints = EndpointResolver::new(pod_config())
            .resolve(&service, &tcp80(), &ClusterSnapshot::default())
            .unwrap();

        assert!(endpoints.is_empty());
    }

    #[test]
    fn test_resolve_unknown_service_port() {
        let service = make_service(vec![http_port(None, None)]);
        let udp80 = ServicePort::new(80, Protocol::Udp);

        let result =
            EndpointResolver::new(pod_config()).resolve(&service, &udp80, &ClusterSnapshot::default());

        assert!(matches!(result, Err(DiscoveryError::ServicePortNotFound(p)) if p == udp80));
    }

    #[test]
    fn test_resolve_protocol_defaults_to_tcp() {
        let no_protocol = K8sServicePort {
            protocol: None,
            ..http_port(None, None)
        };
        let service = make_service(vec![no_protocol]);
        let snapshot = ClusterSnapshot::new(vec![make_slice(
            "IPv4",
            vec![make_port(Some("http"), Some(8080))],
            vec![make_endpoint(vec!["10.0.0.1"], Some(true))],
        )]);

        let endpoints = EndpointResolver::new(pod_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        assert_eq!(addrs(&endpoints), vec!["10.0.0.1:8080"]);
    }

    // Node mode

    #[test]
    fn test_resolve_node_mode_uses_node_port() {
        let service = make_service(vec![http_port(Some(IntOrString::Int(8080)), Some(30080))]);
        let snapshot = ClusterSnapshot::new(vec![make_slice(
            "IPv4",
            vec![make_port(Some("http"), Some(8080))],
            vec![make_node_endpoint("n1", Some(true))],
        )])
        .with_node(make_node("n1", &[("InternalIP", "10.0.0.5")]));

        let endpoints = EndpointResolver::new(node_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        assert_eq!(
            endpoints,
            vec![ServiceEndpoint {
                addr: "10.0.0.5:30080".parse().unwrap(),
                protocol: Protocol::Tcp,
            }]
        );
    }

    #[test]
    fn test_resolve_node_mode_collapses_pods_on_same_node() {
        let service = make_service(vec![http_port(None, Some(30080))]);
        let snapshot = ClusterSnapshot::new(vec![make_slice(
            "IPv4",
            vec![make_port(Some("http"), Some(8080))],
            vec![
                make_node_endpoint("n1", Some(false)),
                make_node_endpoint("n1", Some(true)),
                make_node_endpoint("n2", Some(false)),
            ],
        )])
        .with_node(make_node("n1", &[("InternalIP", "10.0.0.5")]))
        .with_node(make_node("n2", &[("InternalIP", "10.0.0.6")]));

        let endpoints = EndpointResolver::new(node_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        assert_eq!(addrs(&endpoints), vec!["10.0.0.5:30080"]);
    }

    #[test]
    fn test_resolve_node_mode_drops_unresolvable_nodes() {
        let service = make_service(vec![http_port(None, Some(30080))]);
        let snapshot = ClusterSnapshot::new(vec![make_slice(
            "IPv4",
            vec![make_port(Some("http"), Some(8080))],
            vec![
                make_node_endpoint("n1", Some(true)),
                make_node_endpoint("v6-only", Some(true)),
                make_node_endpoint("missing", Some(true)),
                make_endpoint(vec!["10.244.0.11"], Some(true)),
            ],
        )])
        .with_node(make_node("n1", &[("InternalIP", "10.0.0.5")]))
        .with_node(make_node("v6-only", &[("InternalIP", "fd00::6")]));

        let endpoints = EndpointResolver::new(node_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        assert_eq!(addrs(&endpoints), vec!["10.0.0.5:30080"]);
    }

    #[test]
    fn test_resolve_node_mode_requires_node_port() {
        let service = make_service(vec![http_port(None, None)]);
        let snapshot = ClusterSnapshot::new(vec![make_slice(
            "IPv4",
            vec![make_port(Some("http"), Some(8080))],
            vec![make_node_endpoint("n1", Some(true))],
        )])
        .with_node(make_node("n1", &[("InternalIP", "10.0.0.5")]));

        let endpoints = EndpointResolver::new(node_config())
            .resolve(&service, &tcp80(), &snapshot)
            .unwrap();

        assert!(endpoints.is_empty());
    }

    // Node address selection

    #[test]
    fn test_select_node_address_prefers_configured_type() {
        let node = make_node("n1", &[("InternalIP", "10.0.0.5"), ("ExternalIP", "1.2.3.4")]);

        assert_eq!(
            select_node_address(&node, &node_config()).unwrap(),
            "10.0.0.5".parse::<IpAddr>().unwrap()
        );

        let external = ResolverConfig {
            node_address_type: "ExternalIP".to_string(),
            ..node_config()
        };
        assert_eq!(
            select_node_address(&node, &external).unwrap(),
            "1.2.3.4".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_select_node_address_requires_matching_family() {
        let node = make_node("n1", &[("InternalIP", "fd00::5"), ("ExternalIP", "1.2.3.4")]);

        let result = select_node_address(&node, &node_config());

        assert!(matches!(result, Err(DiscoveryError::NoValidNodeAddress(ref n)) if n == "n1"));
    }

    #[test]
    fn test_select_node_address_skips_unparseable_entries() {
        let node = make_node(
            "n1",
            &[
                ("InternalIP", "garbage"),
                ("InternalIP", "fd00::5"),
                ("InternalIP", "10.0.0.7"),
                ("InternalIP", "10.0.0.8"),
            ],
        );

        assert_eq!(
            select_node_address(&node, &node_config()).unwrap(),
            "10.0.0.7".parse::<IpAddr>().unwrap()
        );

        let v6 = ResolverConfig {
            use_ipv6: true,
            ..node_config()
        };
        assert_eq!(
            select_node_address(&node, &v6).unwrap(),
            "fd00::5".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_select_node_address_without_status() {
        let node = Node {
            metadata: ObjectMeta {
                name: Some("bare".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(matches!(
            select_node_address(&node, &node_config()),
            Err(DiscoveryError::NoValidNodeAddress(_))
        ));
    }
}
