use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use workshop_core::{FormError, IngestError};
use workshop_history::MutationError;

/// Failures talking to the remote persistence collaborator
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Network failure or the remote could not be reached at all
    #[error("Remote unreachable: {0}")]
    Unreachable(String),

    /// The remote refused the write (constraint or policy violation)
    #[error("Remote rejected the write: {0}")]
    Rejected(String),

    #[error("Workshop {0} does not exist remotely")]
    Missing(String),
}

impl From<sqlx::Error> for RemoteError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => RemoteError::Rejected(db.message().to_string()),
            sqlx::Error::RowNotFound => RemoteError::Missing(String::new()),
            other => RemoteError::Unreachable(other.to_string()),
        }
    }
}

/// Failures of a Record Store operation, surfaced after any rollback
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Local(#[from] MutationError),

    #[error("Could not save workshop {id}: {source}")]
    Remote {
        id: String,
        #[source]
        source: RemoteError,
    },
}

/// Failures storing an attachment
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error(
        "Storage bucket '{0}' was not found. Create the bucket (directory) under the \
         attachments root or set ATTACHMENTS_BUCKET to an existing one."
    )]
    BucketNotFound(String),

    #[error(
        "Uploads to bucket '{0}' are not permitted. Grant the server write access to the \
         bucket directory and retry."
    )]
    AccessDenied(String),

    #[error("Attachment name is empty")]
    EmptyName,

    #[error("Upload failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures turning a raw report into a record
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Report extraction is not configured")]
    Disabled,

    #[error("Extraction service unavailable: {0}")]
    Service(#[from] reqwest::Error),

    #[error("Could not process the report into structured data.")]
    EmptyResponse,

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Form(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            AppError::Store(StoreError::Local(e @ MutationError::NotFound(_))) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            AppError::Store(StoreError::Local(e)) => (StatusCode::CONFLICT, e.to_string()),
            AppError::Store(e @ StoreError::Remote { .. }) => {
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::Attachment(e @ AttachmentError::EmptyName) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::Attachment(e @ AttachmentError::Io(_)) => {
                tracing::error!("Attachment error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Attachment(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
            AppError::Extraction(ExtractionError::Disabled) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ExtractionError::Disabled.to_string(),
            ),
            AppError::Extraction(e) => {
                tracing::error!("Extraction error: {:?}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Could not process the report into structured data.".to_string(),
                )
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
