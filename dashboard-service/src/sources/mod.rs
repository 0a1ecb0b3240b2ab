pub mod csv_file;
pub mod pgwire;
pub mod postgrest;

pub use csv_file::CsvFileSource;
pub use pgwire::PgwireSource;
pub use postgrest::PostgrestSource;

use std::sync::Arc;

use anyhow::{anyhow, Context};
use pannes_client::rest::PostgrestClient;
use sqlx::postgres::PgPoolOptions;

use crate::config::{SourceConfig, SourceKind};
use crate::pipeline::Source;

/// Build the snapshot source selected by `source.kind`.
pub fn from_config(cfg: &SourceConfig) -> anyhow::Result<Arc<dyn Source>> {
    let source: Arc<dyn Source> = match cfg.kind {
        SourceKind::Rest => {
            let creds = cfg.rest.credentials()?;
            let client = PostgrestClient::new(
                &creds.base_url,
                creds.api_key,
                cfg.rest.timeout(),
                cfg.rest.page_size,
            )
            .context("building PostgREST client")?;
            Arc::new(PostgrestSource::new(client, cfg.table.clone()))
        }
        SourceKind::Pgwire => {
            // Connections open on first fetch.
            let pool = PgPoolOptions::new()
                .max_connections(cfg.pgwire.max_connections)
                .connect_lazy(&cfg.pgwire.uri()?)
                .context("building Postgres pool")?;
            Arc::new(PgwireSource::new(pool, cfg.table.clone()))
        }
        SourceKind::CsvFile => {
            let csv = cfg
                .csv_file
                .as_ref()
                .ok_or_else(|| anyhow!("missing [source.csv_file] section"))?;
            Arc::new(CsvFileSource::new(csv.path.clone()))
        }
    };

    tracing::info!(source = source.name(), table = %cfg.table, "snapshot source configured");
    Ok(source)
}
