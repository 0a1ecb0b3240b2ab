use std::{
    fs::File,
    path::{Path, PathBuf},
};

use csv::StringRecord;
use pannes_client::domain::RawReading;

use crate::pipeline::{PipelineError, Source};

/// Snapshot source reading a CSV export of the `pannes` table.
///
/// Expected header columns (by name):
/// - id
/// - date
/// - poste
/// - status
/// - tension, courant, temperature, frequence (optional, empty = null)
/// - type_panne (optional)
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn parse_optional_f64(s: &str) -> Option<f64> {
    if s.trim().is_empty() {
        None
    } else {
        s.trim().parse().ok()
    }
}

fn parse_optional_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn record_to_raw_reading(record: &StringRecord, headers: &StringRecord) -> Result<RawReading, PipelineError> {
    let get = |name: &str| -> Option<&str> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .and_then(|idx| record.get(idx))
    };

    let id_str = get("id").ok_or_else(|| PipelineError::Source("missing column 'id' in CSV record".to_string()))?;
    let id: i64 = id_str
        .trim()
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid id '{id_str}': {e}")))?;

    Ok(RawReading {
        id,
        date: get("date").and_then(parse_optional_string),
        // Kept verbatim; validation rejects blank values.
        poste: get("poste").map(str::to_string),
        status: get("status").and_then(parse_optional_string),
        tension: get("tension").and_then(parse_optional_f64),
        courant: get("courant").and_then(parse_optional_f64),
        temperature: get("temperature").and_then(parse_optional_f64),
        frequence: get("frequence").and_then(parse_optional_f64),
        type_panne: get("type_panne").and_then(parse_optional_string),
    })
}

fn read_csv(path: &Path) -> Result<Vec<RawReading>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::Source(format!("failed to open CSV file: {e}")))?;
    let mut rdr = csv::Reader::from_reader(file);
    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::Source(format!("failed to read CSV headers: {e}")))?
        .clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| PipelineError::Source(format!("failed to read CSV record: {e}")))?;

        match record_to_raw_reading(&record, &headers) {
            Ok(row) => rows.push(row),
            Err(e) => {
                metrics::counter!("pannes_csv_parse_errors_total").increment(1);
                tracing::warn!(error = %e, "skipping CSV record");
            }
        }
    }

    Ok(rows)
}

#[async_trait::async_trait]
impl Source for CsvFileSource {
    fn name(&self) -> &'static str {
        "csv_file"
    }

    async fn fetch(&self) -> Result<Vec<RawReading>, PipelineError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_csv(&path))
            .await
            .map_err(|e| PipelineError::Source(format!("CSV reader task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn reads_rows_with_optional_columns() {
        let file = write_csv(
            "id,date,poste,status,tension,courant,temperature,frequence,type_panne\n\
             1,2025-03-10 08:00:00,Douala,panne,198.5,,41,49.8,surtension\n\
             2,2025-03-10 09:00:00,Edea,normal,221,10.5,35,50,\n",
        );

        let rows = CsvFileSource::new(file.path()).fetch().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].poste.as_deref(), Some("Douala"));
        assert_eq!(rows[0].courant, None);
        assert_eq!(rows[0].type_panne.as_deref(), Some("surtension"));
        assert_eq!(rows[1].tension, Some(221.0));
        assert_eq!(rows[1].type_panne, None);
    }

    #[tokio::test]
    async fn skips_records_with_bad_id() {
        let file = write_csv(
            "id,date,poste,status\n\
             x,2025-03-10,Douala,panne\n\
             2,2025-03-10,Edea,normal\n",
        );

        let rows = CsvFileSource::new(file.path()).fetch().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 2);
        assert_eq!(rows[0].tension, None);
    }

    #[tokio::test]
    async fn poste_is_read_verbatim() {
        let file = write_csv(
            "id,date,poste,status\n\
             1,2025-03-10, Douala,panne\n\
             2,2025-03-10,Douala,panne\n",
        );

        let rows = CsvFileSource::new(file.path()).fetch().await.unwrap();
        assert_eq!(rows[0].poste.as_deref(), Some(" Douala"));
        assert_eq!(rows[1].poste.as_deref(), Some("Douala"));
    }

    #[tokio::test]
    async fn missing_file_is_a_source_error() {
        let res = CsvFileSource::new("/nonexistent/pannes.csv").fetch().await;
        assert!(matches!(res, Err(PipelineError::Source(_))));
    }
}
