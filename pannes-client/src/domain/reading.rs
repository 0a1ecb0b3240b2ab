use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use time::OffsetDateTime;

/// Substation state recorded with each reading.
///
/// Values outside the two known ones are preserved verbatim so callers can
/// count them separately instead of folding them into either bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Panne,
    Normal,
    Other(String),
}

impl Status {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "panne" => Status::Panne,
            "normal" => Status::Normal,
            other => Status::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Panne => "panne",
            Status::Normal => "normal",
            Status::Other(s) => s,
        }
    }

    pub fn is_panne(&self) -> bool {
        matches!(self, Status::Panne)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One validated row of the `pannes` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub poste: String,
    pub status: Status,
    pub tension: Option<f64>,
    pub courant: Option<f64>,
    pub temperature: Option<f64>,
    pub frequence: Option<f64>,
    pub type_panne: Option<String>,
}

/// A `pannes` row exactly as the data store hands it over.
///
/// `date` and `status` stay textual here; turning them into a [`Reading`]
/// is the caller's validation step.
#[derive(Debug, Clone, Default, Deserialize, sqlx::FromRow)]
pub struct RawReading {
    pub id: i64,
    pub date: Option<String>,
    pub poste: Option<String>,
    pub status: Option<String>,
    pub tension: Option<f64>,
    pub courant: Option<f64>,
    pub temperature: Option<f64>,
    pub frequence: Option<f64>,
    pub type_panne: Option<String>,
}
