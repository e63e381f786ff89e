//! Pages and static files.
//!
//! - GET /                    home page
//! - GET /assets/{*path}      embedded asset, if the resource guard accepts it.
//!   Versioned names (`app-ver-1a2b3c4d.css`) are cached for a year.
//! - GET /avatars/default     default user avatar (JPEG)

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::app::AppState;
use crate::assets::{self, Assets};
use crate::error::{AppError, Result};

const IMMUTABLE: &str = "public, max-age=31536000, immutable";
const NO_CACHE: &str = "no-cache";

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_page))
        .route("/assets/{*path}", get(serve_asset))
        .route("/avatars/default", get(default_avatar))
        .with_state(state)
}

async fn home_page(State(state): State<AppState>) -> Result<Response> {
    serve_page(state.app.home_page())
}

/// Serve an embedded HTML page.
pub fn serve_page(name: &str) -> Result<Response> {
    let content = Assets::get(name).ok_or_else(|| AppError::NotFound {
        kind: "Page",
        id: name.to_string(),
    })?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8")),
            (header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE)),
        ],
        content.data.into_owned(),
    )
        .into_response())
}

async fn serve_asset(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response> {
    let (plain, versioned) = assets::strip_version(&path);

    if !state.app.resource_guard().accept(&plain) {
        tracing::warn!("Resource guard rejected asset request: {}", path);
        return Err(AppError::Forbidden(path));
    }

    let content = Assets::get(&plain).ok_or_else(|| AppError::NotFound {
        kind: "Asset",
        id: plain.clone(),
    })?;
    let mime = mime_guess::from_path(&plain).first_or_octet_stream();
    let content_type = HeaderValue::from_str(mime.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let cache_control = HeaderValue::from_static(if versioned { IMMUTABLE } else { NO_CACHE });

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, cache_control),
        ],
        content.data.into_owned(),
    )
        .into_response())
}

async fn default_avatar(State(state): State<AppState>) -> Response {
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg")),
            (header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400")),
        ],
        state.app.default_user_avatar().to_vec(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};

    use crate::assets;
    use crate::picker::testutil::MemoryStore;
    use crate::routes::testutil::{router, send};

    #[tokio::test]
    async fn home_page_is_public_and_starts_a_session() {
        let router = router(MemoryStore::new(), false);
        let response = send(&router, "GET", "/", None, None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.cookie.unwrap().starts_with("GITOP_SESSION="));
        assert!(String::from_utf8_lossy(&response.body).contains("<title>Gitop</title>"));
    }

    #[tokio::test]
    async fn versioned_asset_is_cached_forever() {
        let router = router(MemoryStore::new(), false);
        let url = assets::asset_url("css/branch-picker.css");

        let response = send(&router, "GET", &url, None, None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers[header::CONTENT_TYPE], "text/css");
        assert_eq!(
            response.headers[header::CACHE_CONTROL],
            "public, max-age=31536000, immutable"
        );

        let plain = send(&router, "GET", "/assets/css/branch-picker.css", None, None).await;
        assert_eq!(plain.status, StatusCode::OK);
        assert_eq!(plain.headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(plain.body, response.body);
    }

    #[tokio::test]
    async fn guard_rejects_unlisted_extensions() {
        let router = router(MemoryStore::new(), false);
        let response = send(&router, "GET", "/assets/secrets.toml", None, None).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn accepted_but_missing_asset_is_not_found() {
        let router = router(MemoryStore::new(), false);
        let response = send(&router, "GET", "/assets/fonts/missing.woff", None, None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn default_avatar_is_served_as_jpeg() {
        let router = router(MemoryStore::new(), false);
        let response = send(&router, "GET", "/avatars/default", None, None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(&response.body[..2], &[0xFF, 0xD8]);
    }
}
