use axum::{extract::State, routing::get, Json, Router};

use crate::app::AppState;
use crate::models::AppInfo;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/app", get(get_app_info))
        .with_state(state)
}

async fn get_app_info(State(state): State<AppState>) -> Json<AppInfo> {
    Json(state.app.info())
}
