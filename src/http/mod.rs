// HTTP surface of the roster daemon.
//
// Endpoints:
//   GET    /students
//   DELETE /students?email=&marker=
//   GET    /students/non-markers
//   DELETE /students/non-markers
//   GET    /students/category-wise
//   POST   /upload                    (multipart: file + marker)
//   GET    /export                    (xlsx download)

pub mod error;
pub mod routes;

use anyhow::{anyhow, Result};
use axum::{
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared per-process state: the single long-lived persistence handle.
pub struct AppState {
    db: Mutex<Connection>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Borrow the persistence handle. Handlers hold the guard only for
    /// the duration of their store calls, never across an await, and
    /// map a failure here to their own endpoint-level error message.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| anyhow!("persistence handle poisoned"))
    }
}

pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let router = build_router(state);

    info!("rosterd listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/students",
            get(routes::students::list_students).delete(routes::students::remove_marker),
        )
        .route(
            "/students/non-markers",
            get(routes::students::list_non_markers).delete(routes::students::delete_non_markers),
        )
        .route(
            "/students/category-wise",
            get(routes::students::category_wise),
        )
        .route("/upload", post(routes::upload::upload_roster))
        .route("/export", get(routes::export::export_report))
        // The dashboard frontend is served separately.
        .layer(CorsLayer::permissive())
        .with_state(state)
}
