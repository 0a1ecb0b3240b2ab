//! Aggregate views derived from one snapshot.
//!
//! Every function here is pure over a slice of readings in snapshot order
//! (newest first) so the page and the JSON endpoint share one computation.

use std::collections::{BTreeMap, HashSet};

use pannes_client::domain::{Reading, Status};
use serde::Serialize;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

pub const TOP_POSTES: usize = 5;
pub const RECENT_FAULTS: usize = 20;
pub const AVERAGE_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Headline {
    pub total: usize,
    pub panne: usize,
    pub normal: usize,
    /// Rows whose status is neither `panne` nor `normal`.
    pub other: usize,
    pub postes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekCount {
    #[serde(skip)]
    pub week_start: Date,
    /// `YYYY-MM-DD/YYYY-MM-DD`, Monday to Sunday.
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PosteCount {
    pub poste: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowAverages {
    #[serde(with = "time::serde::rfc3339")]
    pub since: OffsetDateTime,
    pub readings: usize,
    pub tension: Option<f64>,
    pub courant: Option<f64>,
    pub temperature: Option<f64>,
    pub frequence: Option<f64>,
}

impl WindowAverages {
    /// Rows for the key/value table, in display order.
    pub fn rows(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("Tension moyenne (V)", self.tension),
            ("Courant moyen (A)", self.courant),
            ("Température moyenne (°C)", self.temperature),
            ("Fréquence moyenne (Hz)", self.frequence),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultRow {
    pub poste: String,
    pub tension: Option<f64>,
    pub courant: Option<f64>,
    pub temperature: Option<f64>,
    pub type_panne: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub headline: Headline,
    pub weekly_faults: Vec<WeekCount>,
    pub top_postes: Vec<PosteCount>,
    pub averages: WindowAverages,
    pub recent_faults: Vec<FaultRow>,
    /// Rows dropped by validation before aggregation.
    pub rejected: usize,
}

/// Build every view, or `None` when there is nothing to show yet.
pub fn build_report(readings: &[Reading], now: OffsetDateTime) -> Option<Report> {
    if readings.is_empty() {
        return None;
    }

    Some(Report {
        generated_at: now,
        headline: headline(readings),
        weekly_faults: weekly_faults(readings),
        top_postes: top_postes(readings, TOP_POSTES),
        averages: window_averages(readings, now, AVERAGE_WINDOW_DAYS),
        recent_faults: recent_faults(readings, RECENT_FAULTS),
        rejected: 0,
    })
}

pub fn headline(readings: &[Reading]) -> Headline {
    let mut panne = 0;
    let mut normal = 0;
    let mut other = 0;
    for r in readings {
        match r.status {
            Status::Panne => panne += 1,
            Status::Normal => normal += 1,
            Status::Other(_) => other += 1,
        }
    }

    let postes = readings
        .iter()
        .map(|r| r.poste.as_str())
        .collect::<HashSet<_>>()
        .len();

    Headline {
        total: readings.len(),
        panne,
        normal,
        other,
        postes,
    }
}

pub fn week_start(date: Date) -> Date {
    let back = date.weekday().number_days_from_monday() as i64;
    date - Duration::days(back)
}

/// Fault count per calendar week, oldest week first.
pub fn weekly_faults(readings: &[Reading]) -> Vec<WeekCount> {
    let mut weeks: BTreeMap<Date, usize> = BTreeMap::new();
    for r in readings.iter().filter(|r| r.status.is_panne()) {
        *weeks.entry(week_start(r.date.date())).or_default() += 1;
    }

    weeks
        .into_iter()
        .map(|(start, count)| WeekCount {
            week_start: start,
            label: format!("{}/{}", start, start + Duration::days(6)),
            count,
        })
        .collect()
}

/// The `limit` postes with the most faults. Equal counts keep the
/// alphabetical grouping order.
pub fn top_postes(readings: &[Reading], limit: usize) -> Vec<PosteCount> {
    let mut by_poste: BTreeMap<&str, usize> = BTreeMap::new();
    for r in readings.iter().filter(|r| r.status.is_panne()) {
        *by_poste.entry(r.poste.as_str()).or_default() += 1;
    }

    let mut counts: Vec<PosteCount> = by_poste
        .into_iter()
        .map(|(poste, count)| PosteCount {
            poste: poste.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(round2(sum / n as f64))
    }
}

/// Means over readings dated on or after midnight UTC `days` days before
/// `now`. Null values are skipped; a metric with no values is `None`.
pub fn window_averages(readings: &[Reading], now: OffsetDateTime, days: i64) -> WindowAverages {
    let since = (now.to_offset(UtcOffset::UTC).date() - Duration::days(days))
        .midnight()
        .assume_utc();
    let window: Vec<&Reading> = readings.iter().filter(|r| r.date >= since).collect();

    WindowAverages {
        since,
        readings: window.len(),
        tension: mean(window.iter().filter_map(|r| r.tension)),
        courant: mean(window.iter().filter_map(|r| r.courant)),
        temperature: mean(window.iter().filter_map(|r| r.temperature)),
        frequence: mean(window.iter().filter_map(|r| r.frequence)),
    }
}

/// The first `limit` faults in snapshot order, i.e. the most recent.
pub fn recent_faults(readings: &[Reading], limit: usize) -> Vec<FaultRow> {
    readings
        .iter()
        .filter(|r| r.status.is_panne())
        .take(limit)
        .map(|r| FaultRow {
            poste: r.poste.clone(),
            tension: r.tension,
            courant: r.courant,
            temperature: r.temperature,
            type_panne: r.type_panne.clone(),
            date: r.date,
        })
        .collect()
}
