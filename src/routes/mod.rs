//! HTTP route handlers.
//!
//! Each submodule defines routes for a feature area:
//! - `pages`: Home page, embedded assets behind the resource guard, default avatar
//! - `auth`: Login page, login/logout, current session
//! - `info`: Application startup date and uptime
//! - `depots`: Read-only repository listing (GET /api/v1/depots...)
//! - `pickers`: Cascading repository/branch picker panels (/api/v1/pickers...)
//!
//! Depot and picker routes require a logged-in user unless anonymous access
//! is enabled. Every route runs inside the session middleware.

pub mod auth;
pub mod depots;
pub mod info;
pub mod pages;
pub mod pickers;

use axum::{middleware, Router};

use crate::app::AppState;
use crate::session::{require_user, session_middleware};

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(depots::routes(state.clone()))
        .merge(pickers::routes(state.clone()))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    Router::new()
        .merge(pages::routes(state.clone()))
        .merge(auth::routes(state.clone()))
        .merge(info::routes(state.clone()))
        .merge(protected)
        .layer(middleware::from_fn_with_state(state, session_middleware))
}
