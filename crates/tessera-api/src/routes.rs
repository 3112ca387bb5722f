use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{assets, designs, leaderboard, themes, votes};

/// The full HTTP surface. Everything under `protected` needs a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/assets", get(assets::list_assets))
        .route("/themes", get(themes::list_themes))
        .route("/themes/current", get(themes::current_theme))
        .route("/themes/{theme_id}", get(themes::get_theme))
        .route("/themes/{theme_id}/leaderboard", get(leaderboard::get_leaderboard))
        .route("/themes/{theme_id}/top", get(leaderboard::get_top_designs))
        .route("/themes/{theme_id}/submissions", get(designs::submitted_designs))
        .route("/designs/{design_id}", get(designs::get_design))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/designs", post(designs::create_design))
        .route("/designs/mine", get(designs::my_designs))
        .route("/designs/{design_id}/assets", post(designs::place_asset))
        .route(
            "/designs/{design_id}/assets/{index}",
            put(designs::move_asset).delete(designs::remove_asset),
        )
        .route("/designs/{design_id}/assets/{index}/rotate", post(designs::rotate_asset))
        .route("/designs/{design_id}/background", put(designs::set_background))
        .route("/designs/{design_id}/save", post(designs::save_design).delete(designs::cancel_save))
        .route("/designs/{design_id}/save-status", get(designs::save_status))
        .route("/designs/{design_id}/submit", post(designs::submit_design))
        .route("/designs/{design_id}/close", post(designs::close_design))
        .route(
            "/designs/{design_id}/vote",
            get(votes::get_vote)
                .post(votes::cast_vote)
                .put(votes::change_vote)
                .delete(votes::remove_vote),
        )
        .route("/themes/{theme_id}/rank", get(leaderboard::get_my_rank))
        .route("/themes/{theme_id}/submission", get(leaderboard::get_my_submission))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tessera_core::assets::AssetCatalog;
    use tessera_core::design_manager::Canvas;
    use tessera_db::Database;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{AppStateInner, ServiceSettings};

    fn test_state() -> AppState {
        let store = Arc::new(Database::open_in_memory().unwrap());
        Arc::new(AppStateInner::new(
            store,
            AssetCatalog::builtin(),
            ServiceSettings {
                jwt_secret: "test-secret".into(),
                canvas: Canvas::new(800, 600),
                autosave_debounce: Duration::from_millis(2000),
                theme_duration: chrono::Duration::days(7),
            },
        ))
    }

    async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(app: &Router, username: &str) -> (String, String) {
        let (status, body) = call(
            app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": username, "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        (
            body["token"].as_str().unwrap().to_string(),
            body["user_id"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn accounts_register_once_and_log_in() {
        let app = router(test_state());
        register(&app, "ada").await;

        let (status, body) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": "ADA", "password": "another password" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "username is already taken");

        let (status, _) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "ada", "password": "wrong password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "ada", "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "ada");
    }

    #[tokio::test]
    async fn short_credentials_are_rejected() {
        let app = router(test_state());
        let (status, _) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": "al", "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn protected_routes_ask_to_log_in() {
        let app = router(test_state());
        let (status, body) = call(&app, "POST", "/designs", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "please log in to continue");

        let (status, _) = call(&app, "GET", "/designs/mine", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn no_theme_means_no_current_theme() {
        let app = router(test_state());
        let (status, _) = call(&app, "GET", "/themes/current", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn catalog_is_public() {
        let app = router(test_state());
        let (status, body) = call(&app, "GET", "/assets", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().iter().any(|a| a["id"] == "sofa"));
    }

    #[tokio::test]
    async fn design_submit_vote_and_leaderboard() {
        let state = test_state();
        let theme = state.themes.initialize_default_theme().unwrap().unwrap();
        let app = router(state);

        let (ada, ada_id) = register(&app, "ada").await;
        let (bob, _) = register(&app, "bob").await;

        let (status, body) = call(&app, "GET", "/themes/current", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["theme"]["id"], theme.id.to_string());
        assert!(body["time_remaining_secs"].as_i64().unwrap() > 0);

        let (status, design) = call(&app, "POST", "/designs", Some(&ada), Some(json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = design["id"].as_str().unwrap().to_string();
        assert_eq!(design["user_id"], ada_id);

        let (status, design) = call(
            &app,
            "POST",
            &format!("/designs/{}/assets", id),
            Some(&ada),
            Some(json!({ "asset_id": "sofa", "x": 900, "y": -5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(design["assets"][0]["x"], 800);
        assert_eq!(design["assets"][0]["y"], 0);

        let (status, body) = call(
            &app,
            "PUT",
            &format!("/designs/{}/background", id),
            Some(&ada),
            Some(json!({ "color": "blue" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("#RRGGBB"));

        let (status, _) = call(
            &app,
            "POST",
            &format!("/designs/{}/assets/0/rotate", id),
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, design) = call(&app, "POST", &format!("/designs/{}/submit", id), Some(&ada), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(design["submitted"], true);
        assert_eq!(design["assets"].as_array().unwrap().len(), 1);

        let (status, body) = call(
            &app,
            "POST",
            &format!("/designs/{}/vote", id),
            Some(&ada),
            Some(json!({ "vote_type": "upvote" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "cannot vote on your own design");

        let (status, body) = call(
            &app,
            "POST",
            &format!("/designs/{}/vote", id),
            Some(&bob),
            Some(json!({ "vote_type": "upvote" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["delta"], 1);

        let (status, _) = call(
            &app,
            "POST",
            &format!("/designs/{}/vote", id),
            Some(&bob),
            Some(json!({ "vote_type": "downvote" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, board) = call(&app, "GET", &format!("/themes/{}/leaderboard", theme.id), None, None).await;
        assert_eq!(board[0]["rank"], 1);
        assert_eq!(board[0]["vote_count"], 1);
        assert_eq!(board[0]["username"], "ada");

        let (_, rank) = call(&app, "GET", &format!("/themes/{}/rank", theme.id), Some(&ada), None).await;
        assert_eq!(rank["rank"], 1);
        let (_, rank) = call(&app, "GET", &format!("/themes/{}/rank", theme.id), Some(&bob), None).await;
        assert_eq!(rank["rank"], -1);

        let (_, page) = call(&app, "GET", &format!("/themes/{}/submissions", theme.id), None, None).await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["designs"][0]["vote_count"], 1);

        let (status, body) = call(&app, "GET", &format!("/designs/{}", id), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["vote_count"], 1);

        let (_, body) = call(&app, "GET", &format!("/designs/{}/vote", id), Some(&bob), None).await;
        assert_eq!(body["user_vote"], "upvote");
    }

    #[tokio::test]
    async fn second_design_cannot_be_submitted() {
        let state = test_state();
        state.themes.initialize_default_theme().unwrap();
        let app = router(state);
        let (ada, _) = register(&app, "ada").await;

        let mut ids = vec![];
        for _ in 0..2 {
            let (_, design) = call(&app, "POST", "/designs", Some(&ada), Some(json!({}))).await;
            ids.push(design["id"].as_str().unwrap().to_string());
        }

        let (status, _) = call(&app, "POST", &format!("/designs/{}/submit", ids[0]), Some(&ada), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(&app, "POST", &format!("/designs/{}/submit", ids[1]), Some(&ada), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "already submitted a design for this theme");
    }
}
