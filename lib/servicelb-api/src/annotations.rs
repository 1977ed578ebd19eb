/// Well-known annotation and label keys

/// Service annotation enabling PROXY protocol towards the endpoints (exact value `"true"`)
pub const PROXY_PROTOCOL: &str = "servicelb.datum.net/use-proxy-protocol";

/// Service annotation carrying the per-connection idle timeout as a duration string (`"30s"`)
pub const IDLE_TIMEOUT: &str = "servicelb.datum.net/idle-timeout";

/// Label set by the EndpointSlice controller naming the owning Service
pub const SERVICE_NAME_LABEL: &str = "kubernetes.io/service-name";
