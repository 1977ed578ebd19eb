//! Configuration for the servicelb controller
//!
//! Loaded from an optional YAML file, then overridden from `SERVICELB_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidOverride { key: &'static str, value: String },
}

/// Where endpoint addresses come from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressSource {
    /// Address of the node hosting the endpoint, paired with the Service node port
    #[serde(alias = "node")]
    Node,
    /// Pod addresses from the EndpointSlice, paired with the target port
    #[default]
    #[serde(alias = "pod")]
    Pod,
}

impl FromStr for AddressSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "node" => Ok(AddressSource::Node),
            "pod" => Ok(AddressSource::Pod),
            _ => Err(()),
        }
    }
}

/// One entry of the static ingress status list: an IP or a hostname, never both
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IngressAddress {
    Ip(IpAddr),
    Hostname(String),
}

impl From<String> for IngressAddress {
    fn from(value: String) -> Self {
        match value.parse::<IpAddr>() {
            Ok(ip) => IngressAddress::Ip(ip),
            Err(_) => IngressAddress::Hostname(value),
        }
    }
}

impl From<IngressAddress> for String {
    fn from(value: IngressAddress) -> Self {
        value.to_string()
    }
}

impl fmt::Display for IngressAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngressAddress::Ip(ip) => write!(f, "{}", ip),
            IngressAddress::Hostname(host) => f.write_str(host),
        }
    }
}

/// Controller configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfig {
    /// Reporting component for Events and field manager for status patches
    #[serde(default = "default_controller_name")]
    pub controller_name: String,

    /// The single load balancer class handled by this controller ("" = unset)
    #[serde(default)]
    pub load_balancer_class: String,

    /// Endpoint address source
    #[serde(default)]
    pub address_source: AddressSource,

    /// Node address type used in Node mode (e.g. InternalIP, ExternalIP)
    #[serde(default = "default_node_address_type")]
    pub node_address_type: String,

    /// Operate on IPv6 endpoints instead of IPv4
    #[serde(default, rename = "useIPv6Endpoints")]
    pub use_ipv6_endpoints: bool,

    /// Addresses written to the status of every managed Service
    #[serde(default)]
    pub ingress_status: Vec<IngressAddress>,

    /// Listen address of the Prometheus metrics endpoint
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: SocketAddr,
}

/// Subset of the configuration needed to resolve endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub address_source: AddressSource,
    pub node_address_type: String,
    pub use_ipv6: bool,
}

fn default_controller_name() -> String {
    "servicelb-controller".to_string()
}

fn default_node_address_type() -> String {
    "InternalIP".to_string()
}

fn default_metrics_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9090))
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            controller_name: default_controller_name(),
            load_balancer_class: String::new(),
            address_source: AddressSource::default(),
            node_address_type: default_node_address_type(),
            use_ipv6_endpoints: false,
            ingress_status: Vec::new(),
            metrics_addr: default_metrics_addr(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from an optional YAML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                debug!("Loaded configuration from {}", path.display());
                Self::from_yaml(&raw)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply `SERVICELB_*` overrides using the given variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SERVICELB_CONTROLLER_NAME") {
            self.controller_name = val;
        }

        if let Some(val) = lookup("SERVICELB_LOAD_BALANCER_CLASS") {
            self.load_balancer_class = val;
        }

        if let Some(val) = lookup("SERVICELB_ADDRESS_SOURCE") {
            self.address_source = val.parse().map_err(|_| ConfigError::InvalidOverride {
                key: "SERVICELB_ADDRESS_SOURCE",
                value: val.clone(),
            })?;
        }

        if let Some(val) = lookup("SERVICELB_NODE_ADDRESS_TYPE") {
            self.node_address_type = val;
        }

        if let Some(val) = lookup("SERVICELB_USE_IPV6") {
            self.use_ipv6_endpoints = val.parse().map_err(|_| ConfigError::InvalidOverride {
                key: "SERVICELB_USE_IPV6",
                value: val.clone(),
            })?;
        }

        if let Some(val) = lookup("SERVICELB_INGRESS_STATUS") {
            self.ingress_status = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| IngressAddress::from(s.to_string()))
                .collect();
        }

        if let Some(val) = lookup("SERVICELB_METRICS_ADDR") {
            self.metrics_addr = val.parse().map_err(|_| ConfigError::InvalidOverride {
                key: "SERVICELB_METRICS_ADDR",
                value: val.clone(),
            })?;
        }

        Ok(())
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            address_source: self.address_source,
            node_address_type: self.node_address_type.clone(),
            use_ipv6: self.use_ipv6_endpoints,
        }
    }
}
