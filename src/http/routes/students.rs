use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::http::error::ApiError;
use crate::http::AppState;
use crate::store;

pub async fn list_students(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let internal = |e| ApiError::internal("Failed to fetch students", e);
    let conn = state.conn().map_err(internal)?;
    let students = store::list_all(&conn).map_err(internal)?;
    Ok(Json(json!({ "students": students })))
}

#[derive(Deserialize)]
pub struct RemoveMarkerParams {
    email: Option<String>,
    marker: Option<String>,
}

pub async fn remove_marker(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RemoveMarkerParams>,
) -> Result<Json<Value>, ApiError> {
    let (email, marker) = match (params.email.as_deref(), params.marker.as_deref()) {
        (Some(email), Some(marker)) if !email.is_empty() && !marker.is_empty() => (email, marker),
        _ => return Err(ApiError::bad_request("Email and marker are required")),
    };

    let internal = |e| ApiError::internal("Failed to remove marker", e);
    let conn = state.conn().map_err(internal)?;
    store::remove_marker(&conn, email, marker).map_err(internal)?;
    Ok(Json(json!({ "success": true })))
}

pub async fn list_non_markers(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let internal = |e| ApiError::internal("Failed to fetch non-marker students", e);
    let conn = state.conn().map_err(internal)?;
    let students = store::list_non_markers(&conn).map_err(internal)?;
    Ok(Json(json!({ "students": students })))
}

pub async fn delete_non_markers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let internal = |e| ApiError::internal("Failed to delete non-marker students", e);
    let conn = state.conn().map_err(internal)?;
    let deleted = store::delete_non_markers(&conn).map_err(internal)?;
    Ok(Json(json!({ "success": true, "deletedCount": deleted })))
}

pub async fn category_wise(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let internal = |e| ApiError::internal("Failed to get category-wise count", e);
    let conn = state.conn().map_err(internal)?;
    let counts = store::category_wise_counts(&conn).map_err(internal)?;
    Ok(Json(json!({ "success": true, "data": counts })))
}
