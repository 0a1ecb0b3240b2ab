use crate::pipeline::{PipelineError, Transform};
use pannes_client::domain::{RawReading, Reading, Status};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date,
    OffsetDateTime, PrimitiveDateTime, UtcOffset,
};

/// Parse the textual `date` column into a UTC timestamp.
///
/// Accepts RFC 3339, the Postgres text form (`2025-03-10 08:15:00+01`),
/// naive timestamps (read as UTC) and bare dates (midnight UTC).
pub fn parse_reading_date(input: &str) -> Option<OffsetDateTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut s = trimmed.to_string();
    if s.len() > 10 && s.as_bytes()[10] == b' ' {
        s.replace_range(10..11, "T");
    }

    if s.contains('T') {
        // Postgres writes whole-hour offsets as `+01`.
        let bytes = s.as_bytes();
        let n = bytes.len();
        if n >= 4
            && (bytes[n - 3] == b'+' || bytes[n - 3] == b'-')
            && bytes[n - 2].is_ascii_digit()
            && bytes[n - 1].is_ascii_digit()
            && bytes[n - 4].is_ascii_digit()
        {
            s.push_str(":00");
        }

        if let Ok(ts) = OffsetDateTime::parse(&s, &Rfc3339) {
            return Some(ts.to_offset(UtcOffset::UTC));
        }

        let naive = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
        let naive_subsecond = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
        return PrimitiveDateTime::parse(&s, naive)
            .or_else(|_| PrimitiveDateTime::parse(&s, naive_subsecond))
            .ok()
            .map(PrimitiveDateTime::assume_utc);
    }

    let date_only = format_description!("[year]-[month]-[day]");
    Date::parse(&s, date_only)
        .ok()
        .map(|d| d.midnight().assume_utc())
}

/// Pure validation of a raw `pannes` row.
///
/// Rules:
/// - date must be present and parse; any year is accepted.
/// - poste must not be blank; it is kept byte-for-byte.
/// - status is kept as-is; unknown values become `Status::Other`.
pub fn validate_reading(raw: RawReading) -> Result<Reading, PipelineError> {
    let date = match raw.date.as_deref() {
        None => return Err(PipelineError::Transform("missing date".to_string())),
        Some(s) => parse_reading_date(s)
            .ok_or_else(|| PipelineError::Transform(format!("unparseable date {s:?}")))?,
    };

    let poste = match raw.poste {
        Some(p) if !p.trim().is_empty() => p,
        _ => return Err(PipelineError::Transform("missing poste".to_string())),
    };

    Ok(Reading {
        id: raw.id,
        date,
        poste,
        status: Status::parse(raw.status.as_deref().unwrap_or_default()),
        tension: raw.tension,
        courant: raw.courant,
        temperature: raw.temperature,
        frequence: raw.frequence,
        type_panne: raw.type_panne,
    })
}

#[derive(Clone, Default)]
pub struct ReadingValidation;

impl Transform<RawReading, Reading> for ReadingValidation {
    fn apply(&self, input: RawReading) -> Result<Reading, PipelineError> {
        validate_reading(input)
    }
}
