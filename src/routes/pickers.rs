//! Cascading repository/branch picker endpoints.
//!
//! - POST /api/v1/pickers { repo_id, branch? }
//!   Opens a panel in the session and returns its first render. An unknown
//!   repository renders the empty placeholder.
//! - GET /api/v1/pickers/{id}
//!   Re-renders the panel.
//! - POST /api/v1/pickers/{id}/repository { repo_id }
//!   Upstream selection. Returns replaced components and selection events.
//! - POST /api/v1/pickers/{id}/branch { branch }
//!   Downstream selection.
//! - DELETE /api/v1/pickers/{id}
//!
//! A panel id the session does not know answers 410 Gone. Every request
//! detaches the panel when it finishes, so nothing resolved in one request
//! is reused by the next.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::app::AppState;
use crate::error::Result;
use crate::models::{
    CreatePickerRequest, PanelView, SelectBranchRequest, SelectRepositoryRequest, UpdateResponse,
};
use crate::picker::{in_request, EmitSelection, UpdateTarget};
use crate::session::CurrentSession;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/pickers", post(create_picker))
        .route("/api/v1/pickers/{id}", get(render_picker).delete(close_picker))
        .route("/api/v1/pickers/{id}/repository", post(select_repository))
        .route("/api/v1/pickers/{id}/branch", post(select_branch))
        .with_state(state)
}

async fn create_picker(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(request): Json<CreatePickerRequest>,
) -> Result<(StatusCode, Json<PanelView>)> {
    let store = state.store.as_ref();
    let view = state.sessions.with_session(session.token, |s| {
        let panel = s.open_picker(request.repo_id, request.branch, EmitSelection);
        in_request(panel, |panel| panel.render(store))
    })?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn render_picker(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Result<Json<PanelView>> {
    let store = state.store.as_ref();
    let view = state.sessions.with_session(session.token, |s| {
        in_request(s.picker_mut(&id)?, |panel| panel.render(store))
    })?;
    Ok(Json(view))
}

async fn select_repository(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    Json(request): Json<SelectRepositoryRequest>,
) -> Result<Json<UpdateResponse>> {
    let store = state.store.as_ref();
    let update = state.sessions.with_session(session.token, |s| {
        in_request(s.picker_mut(&id)?, |panel| {
            let mut target = UpdateTarget::new();
            panel.select_repository(store, &mut target, &request.repo_id)?;
            Ok(target.into_response())
        })
    })?;
    Ok(Json(update))
}

async fn select_branch(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    Json(request): Json<SelectBranchRequest>,
) -> Result<Json<UpdateResponse>> {
    let store = state.store.as_ref();
    let update = state.sessions.with_session(session.token, |s| {
        in_request(s.picker_mut(&id)?, |panel| {
            let mut target = UpdateTarget::new();
            panel.select_branch(store, &mut target, &request.branch)?;
            Ok(target.into_response())
        })
    })?;
    Ok(Json(update))
}

async fn close_picker(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .sessions
        .with_session(session.token, |s| s.close_picker(&id))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::git::testutil::{commit_on, fork_repo, init_repo};
    use crate::git::GitDepotStore;
    use crate::picker::testutil::MemoryStore;
    use crate::routes::testutil::{login, router, send};

    fn memory_store() -> MemoryStore {
        MemoryStore::new()
            .with_family_depot("a", "gitop", Some("main"), &["dev", "main"])
            .with_family_depot("b", "gitop", Some("main"), &["main"])
    }

    #[tokio::test]
    async fn switching_repository_resets_branch() {
        let router = router(memory_store(), false);
        let cookie = login(&router).await;

        let created = send(
            &router,
            "POST",
            "/api/v1/pickers",
            Some(&cookie),
            Some(json!({"repo_id": "a", "branch": "dev"})),
        )
        .await;
        assert_eq!(created.status, StatusCode::CREATED);
        let panel = created.json();
        assert_eq!(panel["state"], "ready");
        assert_eq!(panel["branch_picker"]["selected"], "dev");
        let id = panel["markup_id"].as_str().unwrap().to_string();

        let update = send(
            &router,
            "POST",
            &format!("/api/v1/pickers/{}/repository", id),
            Some(&cookie),
            Some(json!({"repo_id": "b"})),
        )
        .await;
        assert_eq!(update.status, StatusCode::OK);
        let update = update.json();
        assert_eq!(
            update["events"],
            json!([{"depot_id": "b", "depot_name": "B", "branch": "main"}])
        );
        let branch_picker = update["components"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["kind"] == "branch_picker")
            .unwrap();
        assert_eq!(branch_picker["selected"], "main");
        assert_eq!(branch_picker["generation"], 1);

        let again = send(
            &router,
            "POST",
            &format!("/api/v1/pickers/{}/repository", id),
            Some(&cookie),
            Some(json!({"repo_id": "b"})),
        )
        .await
        .json();
        assert_eq!(again, json!({"components": [], "events": []}));
    }

    #[tokio::test]
    async fn branch_selection_emits_event() {
        let router = router(memory_store(), false);
        let cookie = login(&router).await;
        let id = send(
            &router,
            "POST",
            "/api/v1/pickers",
            Some(&cookie),
            Some(json!({"repo_id": "a"})),
        )
        .await
        .json()["markup_id"]
            .as_str()
            .unwrap()
            .to_string();

        let update = send(
            &router,
            "POST",
            &format!("/api/v1/pickers/{}/branch", id),
            Some(&cookie),
            Some(json!({"branch": "dev"})),
        )
        .await
        .json();
        assert_eq!(update["events"][0]["branch"], "dev");
    }

    #[tokio::test]
    async fn unknown_repository_renders_empty_panel() {
        let router = router(memory_store(), false);
        let cookie = login(&router).await;
        let response = send(
            &router,
            "POST",
            "/api/v1/pickers",
            Some(&cookie),
            Some(json!({"repo_id": "deleted", "branch": "main"})),
        )
        .await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.json()["state"], "empty");
    }

    #[tokio::test]
    async fn closed_or_foreign_panel_is_gone() {
        let router = router(memory_store(), false);
        let cookie = login(&router).await;
        let id = send(
            &router,
            "POST",
            "/api/v1/pickers",
            Some(&cookie),
            Some(json!({"repo_id": "a"})),
        )
        .await
        .json()["markup_id"]
            .as_str()
            .unwrap()
            .to_string();

        let other = login(&router).await;
        let response = send(&router, "GET", &format!("/api/v1/pickers/{}", id), Some(&other), None).await;
        assert_eq!(response.status, StatusCode::GONE);

        let response = send(&router, "DELETE", &format!("/api/v1/pickers/{}", id), Some(&cookie), None).await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);

        let response = send(&router, "GET", &format!("/api/v1/pickers/{}", id), Some(&cookie), None).await;
        assert_eq!(response.status, StatusCode::GONE);
    }

    #[tokio::test]
    async fn picker_over_forked_repositories_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let upstream = init_repo(&tmp.path().join("gitop"), "main");
        commit_on(&upstream, "main", "initial");
        commit_on(&upstream, "dev", "dev work");
        fork_repo(&tmp.path().join("gitop"), &tmp.path().join("gitop-fork"));

        let router = router(GitDepotStore::new(tmp.path()).unwrap(), false);
        let cookie = login(&router).await;

        let panel = send(
            &router,
            "POST",
            "/api/v1/pickers",
            Some(&cookie),
            Some(json!({"repo_id": "gitop", "branch": "dev"})),
        )
        .await
        .json();
        let options: Vec<_> = panel["repository_picker"]["options"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(options, vec!["gitop", "gitop-fork"]);

        let id = panel["markup_id"].as_str().unwrap();
        let update = send(
            &router,
            "POST",
            &format!("/api/v1/pickers/{}/repository", id),
            Some(&cookie),
            Some(json!({"repo_id": "gitop-fork"})),
        )
        .await
        .json();
        assert_eq!(update["events"][0]["depot_id"], "gitop-fork");
        assert_eq!(update["events"][0]["branch"], "main");

        std::fs::remove_dir_all(tmp.path().join("gitop-fork")).unwrap();
        let view = send(&router, "GET", &format!("/api/v1/pickers/{}", id), Some(&cookie), None)
            .await
            .json();
        assert_eq!(view["state"], "empty");
    }
}
