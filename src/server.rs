//! HTTP front end for the assistant.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/document` | `{"code"}` → `{"documentation"}` |
//! | `POST` | `/review` | `{"code"}` → `{"review"}` |
//! | `GET`  | `/health` | Version and per-dependency readiness |
//!
//! # Error Contract
//!
//! Every failure is a JSON body with a single message:
//!
//! ```json
//! { "error": "bad request: 'code' must be a non-empty string" }
//! ```
//!
//! Status codes: 400 for malformed input, 409 for embedder or dimension
//! disagreements, 502 when the embedder or model fails, 503 when a
//! dependency is unavailable or a corpus was never ingested, 504 on model
//! timeout, and 500 otherwise.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-based editor
//! extensions can call the API directly.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use dev_documento_core::RagError;

use crate::assist::{document_request, review_request};
use crate::config::Config;
use crate::context::AppContext;

/// Build the router over a shared context.
pub fn router(ctx: Arc<AppContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/document", post(handle_document))
        .route("/review", post(handle_review))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(ctx)
}

/// Starts the HTTP server on `bind`, or `[server].bind` when `None`.
///
/// Runs until Ctrl-C, then closes the stores.
pub async fn run_server(config: &Config, bind: Option<&str>) -> anyhow::Result<()> {
    let bind_addr = bind.unwrap_or(config.server.bind.as_str()).to_string();
    let ctx = Arc::new(AppContext::initialize(config).await?);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, router(ctx.clone()))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    ctx.shutdown().await;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

fn status_for(err: &RagError) -> StatusCode {
    match err {
        RagError::BadRequest(_) => StatusCode::BAD_REQUEST,
        RagError::NotReady(_) | RagError::StoreNotFound(_) => StatusCode::SERVICE_UNAVAILABLE,
        RagError::EmbeddingFailure(_) | RagError::ModelFailure(_) => StatusCode::BAD_GATEWAY,
        RagError::ModelTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        RagError::DimensionMismatch { .. } | RagError::EmbedderMismatch { .. } => {
            StatusCode::CONFLICT
        }
        RagError::IngestionFailed(_)
        | RagError::InvalidConfig(_)
        | RagError::Prompt(_)
        | RagError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!("request failed: {:#}", err);
        } else {
            tracing::debug!("request rejected: {}", err);
        }
        AppError {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError {
            status: StatusCode::BAD_REQUEST,
            message: format!("bad request: {}", rejection.body_text()),
        }
    }
}

// ============ POST /document, POST /review ============

/// Request body shared by both endpoints. `code` is optional here so a
/// missing field yields the same 400 as an empty one.
#[derive(Deserialize)]
struct CodeRequest {
    code: Option<String>,
}

impl CodeRequest {
    fn into_code(self) -> Result<String, AppError> {
        self.code.ok_or_else(|| {
            RagError::BadRequest("'code' must be a non-empty string".to_string()).into()
        })
    }
}

#[derive(Serialize)]
struct DocumentResponse {
    documentation: String,
}

#[derive(Serialize)]
struct ReviewResponse {
    review: String,
}

async fn handle_document(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<CodeRequest>, JsonRejection>,
) -> Result<Json<DocumentResponse>, AppError> {
    let Json(req) = payload?;
    let code = req.into_code()?;
    let documentation = document_request(&ctx, &code).await?;
    Ok(Json(DocumentResponse { documentation }))
}

async fn handle_review(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<CodeRequest>, JsonRejection>,
) -> Result<Json<ReviewResponse>, AppError> {
    let Json(req) = payload?;
    let code = req.into_code()?;
    let review = review_request(&ctx, &code).await?;
    Ok(Json(ReviewResponse { review }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    /// `"ok"` when every dependency is ready, `"degraded"` otherwise.
    status: &'static str,
    version: &'static str,
    embedder: bool,
    store: bool,
    model: bool,
}

async fn handle_health(State(ctx): State<Arc<AppContext>>) -> Json<HealthResponse> {
    let embedder = ctx.embedder.is_ready();
    let store = ctx.store.is_ready();
    let model = ctx.generator.is_ready();
    Json(HealthResponse {
        status: if embedder && store && model { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        embedder,
        store,
        model,
    })
}
