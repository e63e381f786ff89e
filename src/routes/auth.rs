//! Login and logout.
//!
//! - GET /login               login page
//! - POST /login { username, password }
//!   Binds the user to the current session and moves it to a new cookie
//!   token. Wrong credentials → 401.
//! - GET|POST /logout
//!   Drops the session (and its picker panels), clears the cookie and
//!   redirects home.
//! - GET /api/v1/session      who the current session belongs to

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Json, Router,
};

use crate::app::{AppState, LOGIN_PAGE};
use crate::error::Result;
use crate::models::{LoginRequest, SessionInfo};
use crate::routes::pages::serve_page;
use crate::session::{cleared_session_cookie, session_cookie, CurrentSession};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
        .route("/api/v1/session", get(session_info))
        .with_state(state)
}

async fn login_page() -> Result<Response> {
    serve_page(LOGIN_PAGE)
}

async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(request): Json<LoginRequest>,
) -> Result<Response> {
    let (token, info) = state
        .sessions
        .login(session.token, &request.username, &request.password)?;

    let mut response = Json(info).into_response();
    if let Ok(cookie) = HeaderValue::from_str(&session_cookie(token)) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Response> {
    state.sessions.logout(session.token)?;

    let mut response = Redirect::to("/").into_response();
    if let Ok(cookie) = HeaderValue::from_str(&cleared_session_cookie()) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

async fn session_info(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<SessionInfo>> {
    let info = state
        .sessions
        .with_session(session.token, |s| Ok(s.info()))?;
    Ok(Json(info))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::picker::testutil::MemoryStore;
    use crate::routes::testutil::{login, router, send};

    #[tokio::test]
    async fn login_binds_user_to_session() {
        let router = router(MemoryStore::new(), false);
        let cookie = login(&router).await;

        let response = send(&router, "GET", "/api/v1/session", Some(&cookie), None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json()["user"], "admin");
    }

    #[tokio::test]
    async fn login_issues_new_session_cookie() {
        let router = router(MemoryStore::new(), false);
        let before = send(&router, "GET", "/api/v1/session", None, None).await;
        let old_cookie = before.cookie.unwrap();

        let response = send(
            &router,
            "POST",
            "/login",
            Some(&old_cookie),
            Some(json!({"username": "admin", "password": "secret"})),
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);
        let new_cookie = response.cookie.unwrap();
        assert_ne!(new_cookie, old_cookie);

        let stale = send(&router, "GET", "/api/v1/session", Some(&old_cookie), None).await;
        assert!(stale.json()["user"].is_null());
        let current = send(&router, "GET", "/api/v1/session", Some(&new_cookie), None).await;
        assert_eq!(current.json()["user"], "admin");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let router = router(MemoryStore::new(), false);
        let response = send(
            &router,
            "POST",
            "/login",
            None,
            Some(json!({"username": "admin", "password": "nope"})),
        )
        .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_clears_cookie_and_redirects_home() {
        let router = router(MemoryStore::new(), false);
        let cookie = login(&router).await;

        let response = send(&router, "POST", "/logout", Some(&cookie), None).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.headers["location"], "/");
        assert_eq!(response.cookie.as_deref(), Some("GITOP_SESSION="));

        // The old cookie now gets a fresh, anonymous session.
        let response = send(&router, "GET", "/api/v1/session", Some(&cookie), None).await;
        assert!(response.json()["user"].is_null());
        assert!(response.cookie.is_some());
    }

    #[tokio::test]
    async fn login_page_is_served() {
        let router = router(MemoryStore::new(), false);
        let response = send(&router, "GET", "/login", None, None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&response.body).contains("Sign in"));
    }
}
