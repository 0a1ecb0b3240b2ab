use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;

use crate::{
    cache::TtlCache,
    pipeline::{Pipeline, PipelineError, Snapshot, Source},
    render,
    report::{self, Report},
    transform::ReadingValidation,
};

/// What one page view resolves to.
pub enum View {
    NoData,
    Report(Box<Report>),
}

/// The reporting view: snapshot pipeline behind a TTL cache.
pub struct Dashboard {
    pipeline: Pipeline<ReadingValidation>,
    cache: TtlCache<Arc<Snapshot>>,
}

impl Dashboard {
    pub fn new(source: Arc<dyn Source>, ttl: Duration) -> Self {
        Self {
            pipeline: Pipeline {
                source,
                transform: ReadingValidation,
            },
            cache: TtlCache::new(ttl),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache.ttl()
    }

    pub async fn snapshot(&self) -> Result<Arc<Snapshot>, PipelineError> {
        self.cache
            .get_or_try_fetch(|| async { self.pipeline.run().await.map(Arc::new) })
            .await
    }

    pub async fn view_at(&self, now: OffsetDateTime) -> Result<View, PipelineError> {
        let snapshot = self.snapshot().await?;
        tracing::debug!(
            age_secs = (now - snapshot.fetched_at).whole_seconds(),
            readings = snapshot.readings.len(),
            "serving snapshot"
        );

        Ok(match report::build_report(&snapshot.readings, now) {
            Some(mut report) => {
                report.rejected = snapshot.rejected;
                View::Report(Box::new(report))
            }
            None => View::NoData,
        })
    }

    pub async fn view(&self) -> Result<View, PipelineError> {
        self.view_at(OffsetDateTime::now_utc()).await
    }

    pub async fn render_page(&self) -> Result<String, PipelineError> {
        let html = match self.view().await? {
            View::NoData => {
                tracing::warn!("snapshot is empty, rendering no-data page");
                render::render_no_data()
            }
            View::Report(report) => render::render_dashboard(&report),
        };
        metrics::counter!("dashboard_renders_total").increment(1);
        Ok(html)
    }
}
