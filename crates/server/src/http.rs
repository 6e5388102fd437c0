//! HTTP endpoints
//!
//! REST API wrapping the self-reflective RAG orchestrator.

use std::time::UNIX_EPOCH;

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use credit_explain_core::{Answer, Citation, Confidence};

use crate::error::ServerError;
use crate::state::AppState;

/// Build the application router: `/query`, `/upload`, `/documents`,
/// `/documents/{name}`, `/metrics`, `/audit/{run_id}`, wrapped in CORS and
/// request tracing.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/upload", post(upload))
        .route("/documents", get(list_documents))
        .route("/documents/:name", get(get_document))
        .route("/metrics", get(metrics))
        .route("/audit/:run_id", get(get_audit))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .with_state(state)
}

/// Explicit origin list rather than `Any`, since credentials are enabled:
/// `http://localhost:5173` and `http://127.0.0.1:5173`.
fn build_cors_layer() -> CorsLayer {
    let origins = [
        HeaderValue::from_static("http://localhost:5173"),
        HeaderValue::from_static("http://127.0.0.1:5173"),
    ];
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
        .allow_credentials(true)
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    case_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueryResponseBody {
    run_id: String,
    audit_id: String,
    explanation: String,
    citations: Vec<Citation>,
    confidence: Confidence,
    follow_up_questions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl QueryResponseBody {
    fn from_answer(run_id: String, audit_id: String, answer: Answer, error: Option<String>) -> Self {
        Self {
            run_id,
            audit_id,
            explanation: answer.explanation,
            citations: answer.citations,
            confidence: answer.confidence,
            follow_up_questions: answer.follow_up_questions.unwrap_or_default(),
            error,
        }
    }
}

/// `POST /query`. Every outcome of `SelfReflectiveRag::run` carries a valid
/// Answer-shaped body — the only outcomes mapped to a non-2xx
/// status are `bad_request` (empty query precondition) and `pipeline_error`
/// (the catch-all for faults escaping the per-stage recovery built into the
/// orchestrator); `empty_retrieval`, `insufficient_support`, and
/// `processing_failure` are recognized business outcomes returned as 200.
async fn query(State(state): State<AppState>, Json(request): Json<QueryRequest>) -> impl IntoResponse {
    let response = state.rag.run(&request.query, request.case_id).await;

    state.metrics.record_run(
        if response.error.is_none() { "success" } else { "error" },
        response.processing_time,
    );
    if response.audit_id.is_empty() {
        state.metrics.record_audit_write_failure();
    }

    let status = match response.error.as_deref() {
        Some("bad_request") => StatusCode::BAD_REQUEST,
        Some("pipeline_error") => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    };

    let body = QueryResponseBody::from_answer(response.run_id, response.audit_id, response.answer, response.error);
    (status, Json(body))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    uploaded: Vec<String>,
}

/// `POST /upload`. Accepts multipart PDF parts and stores the raw bytes
/// under the configured upload directory; parsing and indexing are out of
/// scope — this endpoint only accepts and stores.
async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>, ServerError> {
    tokio::fs::create_dir_all(&state.settings.upload_dir)
        .await
        .map_err(|e| ServerError::Internal(format!("failed to create upload directory: {e}")))?;

    let mut uploaded = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ServerError::BadRequest("multipart part is missing a filename".to_string()))?;

        if !filename.to_ascii_lowercase().ends_with(".pdf") {
            return Err(ServerError::BadRequest(format!(
                "rejected non-PDF upload: {filename}"
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("failed to read upload body: {e}")))?;

        let dest = std::path::Path::new(&state.settings.upload_dir).join(&filename);
        tokio::fs::write(&dest, &bytes)
            .await
            .map_err(|e| ServerError::Internal(format!("failed to persist upload: {e}")))?;

        uploaded.push(filename);
    }

    Ok(Json(UploadResponse { uploaded }))
}

#[derive(Debug, Serialize)]
struct DocumentEntry {
    filename: String,
}

/// `GET /documents`. Lists filenames previously accepted by `/upload`.
async fn list_documents(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ServerError> {
    let mut documents = Vec::new();
    let mut entries = match tokio::fs::read_dir(&state.settings.upload_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Json(serde_json::json!({ "documents": documents })))
        }
        Err(e) => return Err(ServerError::Internal(format!("failed to list uploads: {e}"))),
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ServerError::Internal(format!("failed to read upload directory: {e}")))?
    {
        if let Some(filename) = entry.file_name().to_str() {
            documents.push(DocumentEntry {
                filename: filename.to_string(),
            });
        }
    }

    Ok(Json(serde_json::json!({ "documents": documents })))
}

/// `GET /documents/{name}`. Metadata for a single previously uploaded file.
async fn get_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let path = std::path::Path::new(&state.settings.upload_dir).join(&name);
    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|_| ServerError::NotFound(format!("no such document: {name}")))?;

    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs());

    Ok(Json(serde_json::json!({
        "filename": name,
        "size_bytes": metadata.len(),
        "modified_unix": modified,
    })))
}

/// `GET /metrics`. A JSON stats object, not a
/// raw Prometheus scrape body — `runs_total`, `run_latency_seconds`, and
/// friends are still recorded into the process-wide `metrics` recorder for
/// any scraper that wants it.
async fn metrics(State(state): State<AppState>) -> Json<crate::metrics::MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// `GET /audit/{run_id}`. Reads back the per-run audit file written by
/// `JsonlAuditSink` during `run()`.
async fn get_audit(State(state): State<AppState>, Path(run_id): Path<String>) -> Result<Json<serde_json::Value>, ServerError> {
    let audit_dir = std::path::Path::new(&state.settings.audit_dir);
    let record = state
        .audit_sink
        .read_run(audit_dir, &run_id)
        .await
        .map_err(|e| ServerError::Internal(format!("failed to read audit record: {e}")))?
        .ok_or_else(|| ServerError::NotFound(format!("no audit record for run {run_id}")))?;

    Ok(Json(serde_json::json!(record)))
}
