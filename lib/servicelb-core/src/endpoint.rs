//! Exposure data model
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Identity of a managed Service
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceKey {
    pub namespace: String,
    pub name: String,
}

impl ServiceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// L4 protocol of a claimed port
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Map a Kubernetes protocol name; anything other than TCP/UDP is unsupported
    pub fn from_k8s(protocol: &str) -> Option<Self> {
        match protocol {
            "TCP" => Some(Protocol::Tcp),
            "UDP" => Some(Protocol::Udp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Globally claimed (port, protocol) pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServicePort {
    pub port: u16,
    pub protocol: Protocol,
}

impl ServicePort {
    pub fn new(port: u16, protocol: Protocol) -> Self {
        Self { port, protocol }
    }
}

impl fmt::Display for ServicePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

/// One concrete destination behind a claimed port
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub addr: SocketAddr,
    pub protocol: Protocol,
}

/// Resolved endpoints and connection policy for one claimed port
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePortData {
    /// Ready endpoints, deduplicated and ordered by address
    pub endpoints: Vec<ServiceEndpoint>,
    pub use_proxy_protocol: bool,
    pub idle_timeout: Option<Duration>,
    /// Source ranges allowed to connect; empty means unrestricted
    pub allowed_ip_ranges: Vec<IpNetwork>,
}

/// Complete exposure request of one Service, replaced wholesale on every commit
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceData {
    pub ports: BTreeMap<ServicePort, ServicePortData>,
}

impl ServiceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claimed_ports(&self) -> impl Iterator<Item = &ServicePort> {
        self.ports.keys()
    }
}
