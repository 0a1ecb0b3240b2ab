use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use dashboard_service::{
    pipeline::{PipelineError, Source},
    render, server, Dashboard,
};
use pannes_client::domain::RawReading;
use time::{Duration as TimeDuration, OffsetDateTime};
use tower::ServiceExt;

struct StubSource {
    rows: Vec<RawReading>,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Source for StubSource {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn fetch(&self) -> Result<Vec<RawReading>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(PipelineError::Source("connection refused".to_string()))
        } else {
            Ok(self.rows.clone())
        }
    }
}

fn raw(id: i64, poste: &str, status: &str, date: OffsetDateTime, tension: f64) -> RawReading {
    RawReading {
        id,
        date: Some(date.format(&time::format_description::well_known::Rfc3339).unwrap()),
        poste: Some(poste.to_string()),
        status: Some(status.to_string()),
        tension: Some(tension),
        ..Default::default()
    }
}

fn scenario_rows() -> Vec<RawReading> {
    let now = OffsetDateTime::now_utc();
    vec![
        raw(1, "A", "panne", now, 220.0),
        raw(3, "B", "normal", now, 225.0),
        raw(2, "A", "panne", now - TimeDuration::days(1), 230.0),
    ]
}

fn app(rows: Vec<RawReading>, fail: bool) -> (Router, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = Arc::new(StubSource {
        rows,
        fail,
        calls: calls.clone(),
    });
    let dashboard = Arc::new(Dashboard::new(source, Duration::from_secs(60)));
    (server::router(dashboard), calls)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn index_renders_full_dashboard() {
    let (app, _) = app(scenario_rows(), false);

    let (status, html) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(html.matches("class=\"tile\"").count(), 4);
    assert_eq!(html.matches("<svg").count(), 2);
    assert!(html.contains("Tension moyenne (V)</td><td>225.00</td>"));
}

#[tokio::test]
async fn api_report_matches_scenario_counts() {
    let (app, _) = app(scenario_rows(), false);

    let (status, body) = get(&app, "/api/report").await;
    assert_eq!(status, StatusCode::OK);

    let report: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(report["headline"]["total"], 3);
    assert_eq!(report["headline"]["panne"], 2);
    assert_eq!(report["headline"]["normal"], 1);
    assert_eq!(report["headline"]["postes"], 2);
    assert_eq!(report["top_postes"], serde_json::json!([{ "poste": "A", "count": 2 }]));
    assert_eq!(report["recent_faults"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn empty_table_shows_no_data_warning() {
    let (app, _) = app(Vec::new(), false);

    let (status, html) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(render::NO_DATA_MESSAGE));
    assert!(!html.contains("<svg"));

    let (status, body) = get(&app, "/api/report").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "null");
}

#[tokio::test]
async fn fetch_failure_renders_generic_error_page() {
    let (app, calls) = app(scenario_rows(), true);

    let (status, html) = get(&app, "/").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(html.contains(render::FAILURE_MESSAGE));
    assert!(!html.contains("connection refused"));

    // Failures are not cached: the next view tries again.
    let (status, _) = get(&app, "/api/report").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn page_views_within_ttl_share_one_fetch() {
    let (app, calls) = app(scenario_rows(), false);

    get(&app, "/").await;
    get(&app, "/").await;
    get(&app, "/api/report").await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn healthz_answers_ok() {
    let (app, calls) = app(Vec::new(), true);

    let (status, body) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
