//! Admin endpoints and transport authentication.

pub mod auth;
pub mod handlers;

use axum::{routing::get, Router};

use self::handlers::{get_candidates, get_mocks, get_status};
use crate::http::server::AppState;

/// Admin routes, sharing the bridge's state and token check.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/candidates", get(get_candidates))
        .route("/admin/mocks", get(get_mocks))
}
