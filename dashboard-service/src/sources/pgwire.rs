use pannes_client::{db, domain::RawReading};
use sqlx::postgres::PgPool;

use crate::pipeline::{PipelineError, Source};

/// Snapshot source reading the table directly over the Postgres wire protocol.
pub struct PgwireSource {
    pool: PgPool,
    table: String,
}

impl PgwireSource {
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }
}

#[async_trait::async_trait]
impl Source for PgwireSource {
    fn name(&self) -> &'static str {
        "pgwire"
    }

    async fn fetch(&self) -> Result<Vec<RawReading>, PipelineError> {
        db::fetch_all_readings(&self.pool, &self.table)
            .await
            .map_err(|e| PipelineError::Source(e.to_string()))
    }
}
