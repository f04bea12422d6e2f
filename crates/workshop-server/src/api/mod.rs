mod attachments;
mod dashboard;
mod health;
mod reports;
mod workshops;

use axum::Router;

use crate::AppState;

/// Create the API router
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(workshops::router())
        .merge(dashboard::router())
        .merge(reports::router())
        .merge(attachments::router())
}
