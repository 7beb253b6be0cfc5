//! HTTP transport shim over the pipeline.
//!
//! Routing, CORS and upload mechanics only; every contract of substance
//! lives in [`crate::pipeline`].

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::PipelineError;
use crate::pipeline::QueryPipeline;

pub fn router(pipeline: Arc<QueryPipeline>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/upload_database", post(upload_database))
        .route("/process_question", post(process_question))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "service": "askdb"}))
}

async fn upload_database(
    State(pipeline): State<Arc<QueryPipeline>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError(PipelineError::Validation(format!(
            "malformed multipart body: {}",
            e
        )))
    })? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let contents = field.bytes().await.map_err(|e| {
                ApiError(PipelineError::Validation(format!(
                    "failed to read upload: {}",
                    e
                )))
            })?;
            file = Some((filename, contents));
            break;
        }
    }

    let (filename, contents) =
        file.ok_or_else(|| ApiError(PipelineError::Validation("No file part".to_string())))?;
    pipeline
        .upload_database(&filename, &contents)
        .map_err(ApiError)?;
    Ok(Json(json!({"message": "Database uploaded successfully"})))
}

#[derive(Deserialize)]
struct QuestionRequest {
    question: String,
}

async fn process_question(
    State(pipeline): State<Arc<QueryPipeline>>,
    Json(request): Json<QuestionRequest>,
) -> Response {
    match pipeline.ask(&request.question).await {
        Ok(answer) => Json(answer).into_response(),
        // Execution failures are expected and absorbed into a normal
        // response shape; the request itself completes.
        Err(PipelineError::Execution(message)) => {
            (StatusCode::OK, Json(json!({"error": message}))).into_response()
        }
        Err(e) => ApiError(e).into_response(),
    }
}

/// Maps pipeline error kinds onto transport statuses.
pub struct ApiError(pub PipelineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            PipelineError::Validation(_) | PipelineError::NotReady => StatusCode::BAD_REQUEST,
            PipelineError::Execution(_) => StatusCode::OK,
            PipelineError::Storage(_)
            | PipelineError::Inference(_)
            | PipelineError::Timeout(..) => StatusCode::BAD_GATEWAY,
            PipelineError::Io(_) | PipelineError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}
