use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use std::sync::Arc;

use crate::export;
use crate::http::error::ApiError;
use crate::http::AppState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// GET /export — the full report workbook as a file download. The
/// filename embeds the UTC date of the request.
pub async fn export_report(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let internal = |e| ApiError::internal("Failed to export data", e);
    let conn = state.conn().map_err(internal)?;
    let workbook = export::build_report(&conn).map_err(internal)?;
    drop(conn);

    let filename = format!("students_report_{}.xlsx", Utc::now().format("%Y-%m-%d"));
    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
        (
            header::CACHE_CONTROL,
            "no-store, no-cache, must-revalidate, proxy-revalidate".to_string(),
        ),
        (header::EXPIRES, "0".to_string()),
        (header::PRAGMA, "no-cache".to_string()),
    ];
    Ok((headers, workbook).into_response())
}
