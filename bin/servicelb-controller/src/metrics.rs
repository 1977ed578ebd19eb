//! Prometheus metrics for the controller

use anyhow::Result;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use servicelb_core::ExposureRegistry;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Reconciliation outcomes used as the `result` label
pub mod outcome {
    pub const APPLIED: &str = "applied";
    pub const CONFLICT: &str = "conflict";
    pub const REMOVED: &str = "removed";
    pub const IGNORED: &str = "ignored";
    pub const ERROR: &str = "error";
}

/// Prometheus metrics collector for reconciliation and registry state
#[derive(Clone)]
pub struct MetricsCollector {
    /// Reconciliations by outcome
    pub reconciliations_total: IntCounterVec,
    /// Reconciliations refused because a port is owned by another Service
    pub port_conflicts_total: IntCounter,
    /// Current exposure registry version
    pub registry_version: IntGauge,
    /// Services currently holding an exposure entry
    pub managed_services: IntGauge,
    pub registry: Arc<Registry>,
}

impl MetricsCollector {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let reconciliations_total = IntCounterVec::new(
            Opts::new("servicelb_reconciliations_total", "Service reconciliations by result"),
            &["result"],
        )?;
        let port_conflicts_total = IntCounter::new(
            "servicelb_port_conflicts_total",
            "Reconciliations refused due to a conflicting port",
        )?;
        let registry_version = IntGauge::new(
            "servicelb_registry_version",
            "Version of the committed exposure plan",
        )?;
        let managed_services = IntGauge::new(
            "servicelb_managed_services",
            "Services present in the exposure plan",
        )?;

        registry.register(Box::new(reconciliations_total.clone()))?;
        registry.register(Box::new(port_conflicts_total.clone()))?;
        registry.register(Box::new(registry_version.clone()))?;
        registry.register(Box::new(managed_services.clone()))?;

        Ok(Self {
            reconciliations_total,
            port_conflicts_total,
            registry_version,
            managed_services,
            registry,
        })
    }

    pub fn record_outcome(&self, result: &str) {
        self.reconciliations_total.with_label_values(&[result]).inc();
    }

    /// Refresh the registry gauges
    pub async fn observe_registry(&self, registry: &ExposureRegistry) {
        let snapshot = registry.snapshot().await;
        self.registry_version
            .set(i64::try_from(snapshot.version).unwrap_or(i64::MAX));
        self.managed_services
            .set(i64::try_from(snapshot.services.len()).unwrap_or(i64::MAX));
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Serve `GET /metrics` until the listener fails
pub async fn serve(addr: SocketAddr, collector: MetricsCollector) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let collector = collector.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let response = handle_request(&req, &collector);
                async move { Ok::<_, Infallible>(response) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Error serving metrics connection from {}: {}", peer_addr, e);
            }
        });
    }
}

fn handle_request<B>(req: &Request<B>, collector: &MetricsCollector) -> Response<Full<Bytes>> {
    if req.method() != Method::GET || req.uri().path() != "/metrics" {
        return text_response(StatusCode::NOT_FOUND, "Not Found\n".to_string());
    }

    match collector.gather() {
        Ok(body) => {
            let mut response = text_response(StatusCode::OK, body);
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(e) => {
            warn!("Failed to gather metrics: {}", e);
            text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to gather metrics\n".to_string(),
            )
        }
    }
}

fn text_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
}
