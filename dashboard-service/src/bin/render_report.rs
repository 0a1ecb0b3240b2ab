use anyhow::Result;
use dashboard_service::{config::AppConfig, observability, sources, Dashboard};
use std::env;

/// Fetch one snapshot and write the dashboard page to a file or stdout.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let out_path = env::args().nth(1);

    // Load configuration (can point DASHBOARD_CONFIG to an export-specific file).
    let cfg = AppConfig::load()?;

    let source = sources::from_config(&cfg.source)?;
    let dashboard = Dashboard::new(source, cfg.cache.ttl());
    let html = dashboard.render_page().await?;

    match out_path {
        Some(path) => {
            tokio::fs::write(&path, html).await?;
            tracing::info!(path = %path, "dashboard written");
        }
        None => {
            use tokio::io::AsyncWriteExt;

            let mut stdout = tokio::io::stdout();
            stdout.write_all(html.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
