use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::load_balancer::CandidateStatus;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub processors: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct MockSummary {
    pub count: usize,
    pub keys: Vec<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        processors: state.processors.clone(),
    })
}

pub async fn get_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<CandidateStatus>>, StatusCode> {
    let pool = state.candidates.as_ref().ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(pool.snapshot()))
}

pub async fn get_mocks(State(state): State<AppState>) -> Result<Json<MockSummary>, StatusCode> {
    let store = state.mocks.as_ref().ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(MockSummary {
        count: store.len(),
        keys: store.keys(),
    }))
}
