use std::sync::Arc;

use anyhow::Result;
use dashboard_service::{config::AppConfig, metrics_server, observability, server, sources, Dashboard};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let source = sources::from_config(&cfg.source)?;
    let dashboard = Arc::new(Dashboard::new(source, cfg.cache.ttl()));
    tracing::info!(ttl_secs = dashboard.cache_ttl().as_secs(), "snapshot cache ready");

    server::serve(&cfg.server.bind_addr, server::router(dashboard)).await
}
