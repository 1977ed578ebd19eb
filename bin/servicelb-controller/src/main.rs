use anyhow::{Context as _, Result};
use kube::Client;
use servicelb_api::ControllerConfig;
use servicelb_core::ExposureRegistry;
use servicelb_discovery::{EndpointResolver, KubeClusterReader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod error;
mod events;
mod locks;
mod metrics;
mod service_controller;
mod status;

use events::KubeEventPublisher;
use locks::KeyLocks;
use metrics::MetricsCollector;
use service_controller::Context;
use status::KubeStatusPublisher;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("SERVICELB_LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting servicelb-controller...");

    let config_path = std::env::var_os("SERVICELB_CONFIG").map(PathBuf::from);
    let config = ControllerConfig::load(config_path.as_deref())
        .context("Failed to load controller configuration")?;
    info!(
        load_balancer_class = %config.load_balancer_class,
        address_source = ?config.address_source,
        ipv6 = config.use_ipv6_endpoints,
        "Loaded configuration"
    );

    let client = Client::try_default().await?;
    let metrics = MetricsCollector::new()?;

    let ctx = Arc::new(Context {
        reader: Arc::new(KubeClusterReader::new(client.clone())),
        registry: Arc::new(ExposureRegistry::new()),
        status: Arc::new(KubeStatusPublisher::new(client.clone(), &config.controller_name)),
        events: Arc::new(KubeEventPublisher::new(client.clone(), &config.controller_name)),
        resolver: EndpointResolver::new(config.resolver_config()),
        metrics: metrics.clone(),
        locks: KeyLocks::new(),
        config: Arc::new(config),
    });

    let metrics_addr = ctx.config.metrics_addr;
    tokio::spawn(async move {
        if let Err(e) = metrics::serve(metrics_addr, metrics).await {
            error!("Metrics server error: {}", e);
        }
    });

    let deletions = tokio::spawn(service_controller::watch_deletions(ctx.clone(), client.clone()));

    // Returns once a shutdown signal has been handled
    service_controller::run(ctx, client).await;

    deletions.abort();
    info!("Shutdown complete");

    Ok(())
}
