use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use workshop_core::{comparison, dashboard, dashboard_years, Comparison, DashboardSummary};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Years offered by the year picker
    pub years: Vec<i32>,
    #[serde(flatten)]
    pub summary: DashboardSummary,
}

/// Yearly summary, defaulting to the current year
async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Json<DashboardResponse> {
    let records = state.store.list().await;
    let year = query
        .year
        .unwrap_or_else(|| chrono::Local::now().year());

    Json(DashboardResponse {
        years: dashboard_years(&records),
        summary: dashboard(&records, year),
    })
}

async fn get_comparison(State(state): State<AppState>) -> Json<Comparison> {
    let records = state.store.list().await;
    Json(comparison(&records))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/compare", get(get_comparison))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::api::test_support::{app, get, send};

    #[tokio::test]
    async fn test_dashboard_for_year() {
        let app = app(None).await;
        let (status, body) = send(&app.router, get("/api/dashboard?year=2024")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["year"], 2024);
        assert_eq!(body["recordCount"], 2);
        assert_eq!(body["totalParticipants"], 1650);
        assert_eq!(body["averageRating"], "4.5");
        assert_eq!(body["years"][0], 2030);

        let (_, body) = send(&app.router, get("/api/dashboard?year=2022")).await;
        assert_eq!(body["recordCount"], 0);
        assert_eq!(body["averageRating"], "0.0");
    }

    #[tokio::test]
    async fn test_compare() {
        let app = app(None).await;
        let (status, body) = send(&app.router, get("/api/compare")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"].as_array().unwrap().len(), 2);
        assert_eq!(body["highestRated"], "1");
        assert_eq!(body["rows"][0]["band"], "high");
    }
}
