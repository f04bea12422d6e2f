use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::attachments::Attachment;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub name: String,
}

/// Store an attachment; the client records the returned URL on its draft
async fn upload_attachment(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<Attachment>), AppError> {
    let attachment = state.attachments.upload(&query.name, body.to_vec()).await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/attachments", post(upload_attachment))
}
