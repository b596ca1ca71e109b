use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::http::error::ApiError;
use crate::http::AppState;
use crate::ingest::{self, IngestError};

/// POST /upload — multipart form with a CSV `file` part and a `marker`
/// part naming the uploading module.
pub async fn upload_roster(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut csv_text: Option<String> = None;
    let mut marker: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart form data: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        let text = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart form data: {}", e)))?;
        match name.as_deref() {
            Some("file") => csv_text = Some(text),
            Some("marker") => marker = Some(text),
            _ => {}
        }
    }

    // Empty parts count as missing, like the empty query params on
    // DELETE /students.
    let (csv_text, marker) = match (csv_text, marker) {
        (Some(f), Some(m)) if !f.is_empty() && !m.is_empty() => (f, m),
        _ => return Err(ApiError::bad_request("File and marker are required")),
    };

    let conn = state
        .conn()
        .map_err(|e| ApiError::internal("Failed to process upload", e))?;
    let results = ingest::ingest_csv(&conn, &csv_text, &marker).map_err(|e| match e {
        IngestError::NoDataRows => ApiError::bad_request(e.to_string()),
    })?;
    Ok(Json(json!({ "success": true, "results": results })))
}
