use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use workshop_core::{
    filter_inventory, inventory_categories, Draft, WorkshopForm, WorkshopRecord, ALL_CATEGORIES,
};

use crate::error::AppError;
use crate::AppState;

/// A draft submitted from the editing page
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub draft: Draft,
    /// Free-text category, when custom entry was used
    #[serde(default)]
    pub custom_category: Option<String>,
}

impl Submission {
    fn into_form(self) -> WorkshopForm {
        let mut form = WorkshopForm::from_draft(self.draft);
        if let Some(text) = self.custom_category {
            form.set_custom_category(&text);
        }
        form
    }
}

#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub workshops: Vec<WorkshopRecord>,
    pub categories: Vec<String>,
    pub degraded: bool,
}

/// List workshops, optionally filtered
async fn list_workshops(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> Json<InventoryResponse> {
    let records = state.store.list().await;
    let category = query.category.as_deref().unwrap_or(ALL_CATEGORIES);
    let search = query.search.as_deref().unwrap_or_default();

    Json(InventoryResponse {
        workshops: filter_inventory(&records, category, search)
            .into_iter()
            .cloned()
            .collect(),
        categories: inventory_categories(&records),
        degraded: state.store.is_degraded().await,
    })
}

/// Create a workshop from a submitted draft
async fn create_workshop(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> Result<(StatusCode, Json<WorkshopRecord>), AppError> {
    let record = submission.into_form().finalize();
    state.store.add(record.clone()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Get a workshop by ID
async fn get_workshop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkshopRecord>, AppError> {
    let record = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Workshop {} not found", id)))?;
    Ok(Json(record))
}

/// Replace a workshop with a submitted draft
async fn update_workshop(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(submission): Json<Submission>,
) -> Result<Json<WorkshopRecord>, AppError> {
    let record = submission.into_form().with_editing(id).finalize();
    state.store.update(record.clone()).await?;
    Ok(Json(record))
}

/// Delete a workshop
async fn delete_workshop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/workshops", get(list_workshops).post(create_workshop))
        .route(
            "/api/workshops/:id",
            get(get_workshop)
                .put(update_workshop)
                .delete(delete_workshop),
        )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{app, get, json, send};
    use crate::remote::Operation;

    fn submission(title: &str) -> serde_json::Value {
        json!({
            "draft": {
                "title": title,
                "date": "2024-07-01",
                "agenda": [
                    { "particulars": "Opening", "speakerName": "Jane Doe", "isActivity": false },
                    { "particulars": "Drill", "speakerName": "Panel", "isActivity": true }
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_list_and_filter() {
        let app = app(None).await;
        let (status, body) = send(&app.router, get("/api/workshops")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["workshops"].as_array().unwrap().len(), 2);
        assert_eq!(body["categories"][0], "All");
        assert_eq!(body["degraded"], false);

        let (_, body) = send(&app.router, get("/api/workshops?search=zoom")).await;
        assert_eq!(body["workshops"][0]["id"], "2");
        let (_, body) = send(&app.router, get("/api/workshops?category=AI%20Literacy&search=delhi")).await;
        assert!(body["workshops"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_derives_and_persists() {
        let app = app(None).await;
        let (status, body) = send(&app.router, json("POST", "/api/workshops", &submission("Safety Day"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["speakers"][0]["name"], "Jane Doe");
        assert_eq!(body["speakers"].as_array().unwrap().len(), 1);
        assert_eq!(body["activities"], json!(["Drill"]));
        assert_eq!(body["category"], "Teacher Training");

        let id = body["id"].as_str().unwrap().to_string();
        let (status, fetched) = send(&app.router, get(&format!("/api/workshops/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["title"], "Safety Day");
        assert_eq!(app.remote.rows().len(), 3);
    }

    #[tokio::test]
    async fn test_create_custom_category_blank() {
        let app = app(None).await;
        let mut body = submission("Misc");
        body["customCategory"] = json!("  ");
        let (_, created) = send(&app.router, json("POST", "/api/workshops", &body)).await;
        assert_eq!(created["category"], "Uncategorized");
    }

    #[tokio::test]
    async fn test_failed_create_rolls_back() {
        let app = app(None).await;
        app.remote.fail(Operation::Insert);
        let (status, body) = send(&app.router, json("POST", "/api/workshops", &submission("Lost"))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("row-level security"));
        assert_eq!(app.state.store.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let app = app(None).await;
        let (status, body) = send(&app.router, json("PUT", "/api/workshops/1", &submission("Renamed"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "1");
        assert_eq!(app.state.store.get("1").await.unwrap().title(), "Renamed");

        let (status, _) = send(&app.router, json("PUT", "/api/workshops/404", &submission("X"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let delete = axum::http::Request::delete("/api/workshops/1")
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, body) = send(&app.router, delete).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], true);

        let (status, body) = send(&app.router, get("/api/workshops/1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Workshop 1 not found");
    }
}
