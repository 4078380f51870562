//! HTTP surface: routes, multipart reading and error-to-JSON mapping.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dispatcher::Registry;
use crate::error::ParseError;
use crate::handlers::UploadedFile;
use crate::schema::ParsedDocument;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/parse", post(parse_document))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_code: &'static str,
    pub message: String,
    pub status: u16,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error_code,
                message: message.into(),
                status: status.as_u16(),
            },
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "UNSUPPORTED_FILE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::InvalidInput(message) => Self::validation(message),
            ParseError::UnsupportedContent(message) => Self::unsupported(message),
            ParseError::EngineFailure(message) => Self::internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Pull the `file` part out of the form.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read file: {}", e)))?;

        if data.is_empty() {
            break;
        }
        return Ok(UploadedFile::new(file_name, content_type, data.to_vec()));
    }

    Err(ApiError::validation("File must not be null or empty"))
}

/// Upload a document and return its unified parse.
async fn parse_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ParsedDocument>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;
    let file = read_upload(multipart).await?;

    let request_id = Uuid::new_v4();
    info!(
        "[{}] Received file: {} ({} bytes, {})",
        request_id,
        file.file_name,
        file.size(),
        file.content_type.as_deref().unwrap_or("no content type")
    );

    let registry = state.registry.clone();
    let result = tokio::task::spawn_blocking(move || registry.parse(&file))
        .await
        .map_err(|e| {
            error!("[{}] Parse worker failed: {}", request_id, e);
            ApiError::internal("Unexpected error while parsing the document")
        })?;

    match result {
        Ok(document) => {
            info!("[{}] Parse complete", request_id);
            Ok(Json(document))
        }
        Err(e) => {
            warn!("[{}] Parse failed: {}", request_id, e);
            Err(e.into())
        }
    }
}
