//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::{
    handlers,
    models::{ApiResponse, CreateJobRequest},
};
use crate::pipeline::Pipeline;
use crate::progress::ProgressHandle;
use crate::store::MemoryStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub jobs: MemoryStore<ProgressHandle>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            jobs: MemoryStore::new(),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/jobs", get(list_jobs_handler).post(create_job_handler))
        .route("/api/progress/:job_id", get(progress_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Configure and start the HTTP server
pub async fn start_http_server(state: AppState, port: u16) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("🌐 API server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    match handlers::health_check().await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            (status, Json(serde_json::json!({"error": e.to_string()}))).into_response()
        }
    }
}

async fn create_job_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> impl IntoResponse {
    match handlers::create_job(&state, request).await {
        Ok(created) => (StatusCode::ACCEPTED, Json(ApiResponse::success(created))).into_response(),
        Err(e) => {
            warn!("Rejected job request: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error(e.to_string())),
            )
                .into_response()
        }
    }
}

async fn list_jobs_handler(State(state): State<AppState>) -> impl IntoResponse {
    let jobs = handlers::list_jobs(&state).await;
    (StatusCode::OK, Json(ApiResponse::success(jobs))).into_response()
}

async fn progress_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    match handlers::job_progress(&state, &job_id).await {
        Some(job) => (StatusCode::OK, Json(job)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(format!("Job not found: {}", job_id))),
        )
            .into_response(),
    }
}
