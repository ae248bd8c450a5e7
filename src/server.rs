//! Read-only HTTP surface for the built dashboard.
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::info;

use crate::chart::ChartSpec;
use crate::error::DashError;
use crate::page::{self, Dashboard};

/// The dashboard plus its rendered page. Immutable once built.
pub struct Site {
    dashboard: Dashboard,
    html: String,
}

impl Site {
    pub fn new(dashboard: Dashboard) -> Result<Self, DashError> {
        let html = page::render(&dashboard)?;
        Ok(Self { dashboard, html })
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

pub fn router(site: Arc<Site>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/charts", get(charts))
        .route("/healthz", get(health))
        .with_state(site)
}

async fn index(State(site): State<Arc<Site>>) -> Html<String> {
    Html(site.html.clone())
}

async fn charts(State(site): State<Arc<Site>>) -> Json<Vec<ChartSpec>> {
    Json(site.dashboard.charts().cloned().collect())
}

async fn health(State(site): State<Arc<Site>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "charts": site.dashboard.charts().count(),
    }))
}

/// Bind and serve until ctrl-c.
pub async fn serve(site: Arc<Site>, addr: SocketAddr) -> Result<(), DashError> {
    let listener = TcpListener::bind(addr).await?;
    info!("Dashboard listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(site))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("dashboard server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::page::{Description, Section};
    use crate::chart::{LayoutOptions, SelectorPlacement};

    fn site() -> Arc<Site> {
        let chart = ChartSpec {
            id: "only".to_string(),
            title: "Only".to_string(),
            traces: Vec::new(),
            selector: None,
            selector_placement: SelectorPlacement::Default,
            annotations: Vec::new(),
            layout: LayoutOptions::default(),
        };
        let dashboard = Dashboard::new(
            "Test",
            vec![Section::single(chart, Description::new("Only", &[]))],
        );
        Arc::new(Site::new(dashboard).unwrap())
    }

    async fn get_body(path: &str) -> (StatusCode, String) {
        let response = router(site())
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn serves_page() {
        let (status, body) = get_body("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Test</h1>"));
    }

    #[tokio::test]
    async fn serves_chart_specs() {
        let (status, body) = get_body("/api/charts").await;
        assert_eq!(status, StatusCode::OK);
        let charts: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(charts[0]["id"], "only");
    }

    #[tokio::test]
    async fn health_reports_chart_count() {
        let (_, body) = get_body("/healthz").await;
        let health: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["charts"], 1);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let (status, _) = get_body("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
