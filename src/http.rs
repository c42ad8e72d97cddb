use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use cpcache_util::FetchError;

use crate::service::ContestService;
use crate::Result;

#[derive(Clone)]
pub struct AppState {
    svc: Arc<ContestService>,
}

pub fn router(svc: Arc<ContestService>, cors: CorsLayer) -> Router {
    let state = AppState { svc };
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/contest", get(contest))
        .route("/api/standings", get(standings))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Cross origin policy for the leaderboard frontend; any origin when none is
/// configured.
pub fn cors(allowed_origins: &[String]) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods([Method::GET]);
    if allowed_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid allowed origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

pub async fn serve(listen: SocketAddr, svc: Arc<ContestService>, cors: CorsLayer) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Could not listen on {}", listen))?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(svc, cors))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server stopped unexpectedly")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(err) => {
            warn!("Could not listen for ctrl-c ({}), running until killed", err);
            futures::future::pending::<()>().await
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn contest(State(st): State<AppState>) -> std::result::Result<Response, AppError> {
    let contest = st.svc.contest().await?;
    Ok(Json(&*contest).into_response())
}

async fn standings(State(st): State<AppState>) -> std::result::Result<Response, AppError> {
    let standings = st.svc.standings().await?;
    Ok(Json(&*standings).into_response())
}

#[derive(Debug)]
pub struct AppError(FetchError);

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        Self(err)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0 {
            FetchError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(kind = self.0.kind(), error = %self.0, "request failed");
        let body = Json(json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use cpcache_origin::{ContestMeta, Outcome};

    use super::*;
    use crate::service::tests::{build_service, settings, standings_snapshot, FakeAcquirer};

    async fn spawn(svc: ContestService) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::new(svc), cors(&[]).unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_contest_endpoint() {
        let primary = FakeAcquirer::meta(vec![Outcome::Success(ContestMeta {
            title: "Weekly #12".into(),
            problems: None,
        })]);
        let (svc, _) = build_service(settings(), primary, FakeAcquirer::meta(vec![]));
        let base = spawn(svc).await;

        let res = reqwest::get(format!("{}/api/contest", base)).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["title"], "Weekly #12");
        assert_eq!(body["id"], "123");
        assert_eq!(body["password"], Value::Null);
        assert_eq!(body["problems"][2], json!({"label": "C", "title": "Sort"}));
    }

    #[tokio::test]
    async fn test_standings_endpoint_keeps_positional_shape() {
        let primary = FakeAcquirer::standings(vec![Outcome::Success(standings_snapshot())]);
        let (svc, _) = build_service(settings(), primary, FakeAcquirer::standings(vec![]));
        let base = spawn(svc).await;

        let body: Value = reqwest::get(format!("{}/api/standings", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(
            body,
            json!({
                "participants": {"7": ["alice", "Alice"]},
                "submissions": [[7, 0, 1, 60]],
            })
        );
    }

    #[tokio::test]
    async fn test_both_strategies_failing_is_bad_gateway() {
        let primary = FakeAcquirer::meta(vec![Outcome::HardFailure(FetchError::transport(
            "operation timed out",
        ))]);
        let fallback = FakeAcquirer::meta(vec![Outcome::HardFailure(FetchError::Challenge(
            "page title is \"Just a moment...\"".into(),
        ))]);
        let (svc, _) = build_service(settings(), primary, fallback);
        let base = spawn(svc).await;

        let res = reqwest::get(format!("{}/api/contest", base)).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::BAD_GATEWAY);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "aggregate");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("Challenge not cleared"));
    }

    #[tokio::test]
    async fn test_missing_settings_is_service_unavailable() {
        let settings = cpcache_config::ContestSettings::default();
        let (svc, _) = build_service(settings, FakeAcquirer::meta(vec![]), FakeAcquirer::meta(vec![]));
        let base = spawn(svc).await;

        let res = reqwest::get(format!("{}/api/standings", base)).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "configuration");
    }

    #[tokio::test]
    async fn test_healthz() {
        let (svc, _) = build_service(settings(), FakeAcquirer::meta(vec![]), FakeAcquirer::meta(vec![]));
        let base = spawn(svc).await;

        let body = reqwest::get(format!("{}/healthz", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[test]
    fn test_cors_rejects_invalid_origin() {
        assert!(cors(&["https://leaderboard.example.com".to_owned()]).is_ok());
        assert!(cors(&["bad\norigin".to_owned()]).is_err());
    }
}
