use pannes_client::{domain::RawReading, rest::PostgrestClient};

use crate::pipeline::{PipelineError, Source};

/// Snapshot source backed by the data store's PostgREST endpoint.
pub struct PostgrestSource {
    client: PostgrestClient,
    table: String,
}

impl PostgrestSource {
    pub fn new(client: PostgrestClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait::async_trait]
impl Source for PostgrestSource {
    fn name(&self) -> &'static str {
        "postgrest"
    }

    async fn fetch(&self) -> Result<Vec<RawReading>, PipelineError> {
        self.client
            .fetch_all(&self.table)
            .await
            .map_err(|e| PipelineError::Source(e.to_string()))
    }
}
