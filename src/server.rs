//! HTTP transport for the analysis pipeline.
//!
//! Routes:
//! - `GET /`: banner
//! - `POST /api/analyze`: analyze one repository, body `{"repository": "<url>"}`
//! - `POST /api/batch`: run one batch over the catalog
//!
//! Every `/api` route requires the `X-API-Key` header to match the
//! configured key; rejected requests never reach the pipeline.

use std::future::Future;
use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::context::Context;
use crate::di::FromRef;
use crate::error::AppError;
use crate::models::{BatchReport, TechnologySet};
use crate::services::{AnalysisService, BatchService};

const API_KEY_HEADER: &str = "X-API-Key";

/// Routes registered by [`router`], as `(method, path)`.
pub const ROUTES: &[(&str, &str)] = &[
    ("GET", "/"),
    ("POST", "/api/analyze"),
    ("POST", "/api/batch"),
];

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    repository: Option<String>,
}

/// Builds the application router over `ctx`.
pub fn router(ctx: Context) -> Router {
    let api = Router::new()
        .route("/analyze", post(analyze))
        .route("/batch", post(batch))
        .layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    Router::new()
        .route("/", get(index))
        .nest("/api", api)
        .layer(middleware::from_fn(log_requests))
        .with_state(ctx)
}

/// Binds `addr` and serves [`router`] until the process is stopped.
pub async fn serve(ctx: Context, addr: std::net::SocketAddr) -> Result<(), AppError> {
    let development = ctx.config.is_development();
    let app = router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    if development {
        for (method, path) in ROUTES {
            tracing::info!("{:<6} {}", method, path);
        }
    }
    tracing::info!("Stackscan HTTP server listening on http://{}", addr);

    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!(error = %e, "HTTP server error");
        AppError::Internal(format!("HTTP server error: {}", e))
    })
}

async fn index() -> &'static str {
    "Stackscan - Repository Stack Analyzer API"
}

/// Rejects requests whose `X-API-Key` header does not match the configured key.
async fn auth_middleware(State(ctx): State<Context>, req: Request, next: Next) -> Response {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if !ctx.config.api_key.is_empty() && key == ctx.config.api_key => {
            next.run(req).await
        }
        _ => {
            tracing::debug!(path = %req.uri().path(), "Rejected unauthenticated request");
            AppError::Unauthorized.into_response()
        }
    }
}

/// Logs method, path, status and latency of every request.
async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Handled request"
    );
    response
}

/// Applies the configured request timeout to an analyze request.
///
/// On expiry the pipeline future is dropped, which releases its workspace.
async fn with_timeout<T>(
    ctx: &Context,
    fut: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    match ctx.config.server.request_timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), fut)
            .await
            .map_err(|_| AppError::Timeout(Duration::from_secs(secs)))?,
        None => fut.await,
    }
}

async fn analyze(
    State(ctx): State<Context>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<TechnologySet>, AppError> {
    let repository = body
        .ok()
        .and_then(|Json(req)| req.repository)
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Repository URL is required".into()))?;

    let analysis = AnalysisService::from_ref(&ctx);
    let techs = with_timeout(&ctx, analysis.analyze_url(&repository)).await?;
    Ok(Json(techs))
}

/// The request timeout is applied per tool inside the batch, so a slow
/// repository yields an error record instead of discarding the report.
async fn batch(State(ctx): State<Context>) -> Result<Json<BatchReport>, AppError> {
    let report = BatchService::from_ref(&ctx).run().await?;
    Ok(Json(report))
}
