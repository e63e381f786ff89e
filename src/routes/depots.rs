//! Read-only repository endpoints.
//!
//! - GET /api/v1/depots                     all hosted repositories
//! - GET /api/v1/depots/{id}                one repository with its branches
//! - GET /api/v1/depots/{id}/branches       branches with tip commits

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::app::AppState;
use crate::error::Result;
use crate::models::{BranchInfo, Depot, DepotSummary};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/depots", get(list_depots))
        .route("/api/v1/depots/{id}", get(get_depot))
        .route("/api/v1/depots/{id}/branches", get(list_branches))
        .with_state(state)
}

async fn list_depots(State(state): State<AppState>) -> Result<Json<Vec<DepotSummary>>> {
    Ok(Json(state.store.list()?))
}

async fn get_depot(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Depot>> {
    Ok(Json(state.store.load(&id)?))
}

async fn list_branches(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<BranchInfo>>> {
    Ok(Json(state.store.load(&id)?.branches))
}
