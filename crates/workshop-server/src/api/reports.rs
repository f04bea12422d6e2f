use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use workshop_core::{generate_id, parse_extraction, record_from_extraction, WorkshopRecord};

use crate::error::{AppError, ExtractionError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    /// Free-text workshop report
    pub text: String,
}

/// Extract a record from a raw report and add it to the archive
async fn process_report(
    State(state): State<AppState>,
    Json(req): Json<ReportRequest>,
) -> Result<(StatusCode, Json<WorkshopRecord>), AppError> {
    let extractor = state.extractor.as_ref().ok_or(ExtractionError::Disabled)?;
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Report text is empty".to_string()));
    }

    let output = extractor.extract(&req.text).await?;
    let extracted = parse_extraction(&output).map_err(ExtractionError::from)?;
    let record = record_from_extraction(extracted, generate_id(), chrono::Local::now().date_naive())
        .map_err(ExtractionError::from)?;

    tracing::info!(id = %record.id, title = %record.title(), "Report processed");
    state.store.add(record.clone()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/reports", post(process_report))
}
