use std::{sync::Arc, time::Instant};

use pannes_client::domain::{RawReading, Reading};
use time::OffsetDateTime;

/// Every reading fetched at one point in time, newest first.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub readings: Vec<Reading>,
    pub fetched_at: OffsetDateTime,
    pub rejected: usize,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("transform error: {0}")]
    Transform(String),
}

#[async_trait::async_trait]
pub trait Source: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<Vec<RawReading>, PipelineError>;
}

pub trait Transform<I, O>: Send + Sync {
    fn apply(&self, input: I) -> Result<O, PipelineError>;
}

pub struct Pipeline<T> {
    pub source: Arc<dyn Source>,
    pub transform: T,
}

impl<T> Pipeline<T>
where
    T: Transform<RawReading, Reading>,
{
    /// Pull one full snapshot. Rows the transform rejects are dropped and
    /// counted; a source failure aborts the whole snapshot.
    pub async fn run(&self) -> Result<Snapshot, PipelineError> {
        let started = Instant::now();
        metrics::counter!("snapshot_fetch_total").increment(1);

        let raw = match self.source.fetch().await {
            Ok(rows) => rows,
            Err(e) => {
                metrics::counter!("snapshot_fetch_failed_total").increment(1);
                tracing::error!(source = self.source.name(), error = %e, "snapshot fetch failed");
                return Err(e);
            }
        };
        metrics::histogram!("snapshot_fetch_seconds").record(started.elapsed().as_secs_f64());

        let fetched = raw.len();
        let mut readings = Vec::with_capacity(fetched);
        let mut rejected = 0usize;

        for row in raw {
            let id = row.id;
            match self.transform.apply(row) {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    rejected += 1;
                    tracing::warn!(id, error = %e, "reading rejected");
                }
            }
        }

        if rejected > 0 {
            metrics::counter!("readings_rejected_total").increment(rejected as u64);
        }

        // Sources already order by date; this keeps file exports consistent
        // and leaves equal dates in source order.
        readings.sort_by(|a, b| b.date.cmp(&a.date));

        tracing::info!(
            source = self.source.name(),
            fetched,
            accepted = readings.len(),
            rejected,
            "snapshot loaded"
        );

        Ok(Snapshot {
            readings,
            fetched_at: OffsetDateTime::now_utc(),
            rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::ReadingValidation;

    struct FixedSource(Vec<RawReading>);

    #[async_trait::async_trait]
    impl Source for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self) -> Result<Vec<RawReading>, PipelineError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    #[async_trait::async_trait]
    impl Source for BrokenSource {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn fetch(&self) -> Result<Vec<RawReading>, PipelineError> {
            Err(PipelineError::Source("connection refused".to_string()))
        }
    }

    fn raw(id: i64, date: &str, poste: &str) -> RawReading {
        RawReading {
            id,
            date: Some(date.to_string()),
            poste: Some(poste.to_string()),
            status: Some("normal".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn run_drops_invalid_rows_and_orders_newest_first() {
        let pipeline = Pipeline {
            source: Arc::new(FixedSource(vec![
                raw(1, "2025-03-01T10:00:00Z", "A"),
                raw(2, "not a date", "A"),
                raw(3, "2025-03-05T10:00:00Z", "B"),
                raw(4, "2025-03-02T10:00:00Z", ""),
            ])),
            transform: ReadingValidation,
        };

        let snapshot = pipeline.run().await.unwrap();
        assert_eq!(snapshot.rejected, 2);
        let ids: Vec<i64> = snapshot.readings.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn run_propagates_source_failure() {
        let pipeline = Pipeline {
            source: Arc::new(BrokenSource),
            transform: ReadingValidation,
        };

        let res = pipeline.run().await;
        assert!(matches!(res, Err(PipelineError::Source(_))));
    }
}
