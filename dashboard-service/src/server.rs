use std::{net::SocketAddr, sync::Arc};

use anyhow::anyhow;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::{
    dashboard::{Dashboard, View},
    pipeline::PipelineError,
    render,
    report::Report,
};

/// Fetch failures abort the view with a generic page; details go to the log.
struct PageError(PipelineError);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "dashboard render aborted");
        (StatusCode::BAD_GATEWAY, Html(render::render_failure())).into_response()
    }
}

struct ApiError(PipelineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "report request failed");
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": "data store unavailable" })),
        )
            .into_response()
    }
}

pub fn router(dashboard: Arc<Dashboard>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/report", get(api_report))
        .route("/healthz", get(healthz))
        .with_state(dashboard)
}

async fn index(State(dashboard): State<Arc<Dashboard>>) -> Result<Html<String>, PageError> {
    dashboard.render_page().await.map(Html).map_err(PageError)
}

/// Same views as the page, `null` while the table is empty.
async fn api_report(State(dashboard): State<Arc<Dashboard>>) -> Result<Json<Option<Report>>, ApiError> {
    match dashboard.view().await.map_err(ApiError)? {
        View::NoData => Ok(Json(None)),
        View::Report(report) => Ok(Json(Some(*report))),
    }
}

async fn healthz() -> &'static str {
    "ok"
}

pub async fn serve(bind_addr: &str, app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow!("invalid server.bind_addr {bind_addr:?}: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "dashboard listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
