pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod policy;
pub mod services;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::mail::Mailer;
use crate::services::{ContentService, GroupService, IdentityService, LookupService};

/// Shared application state: every component receives its store handle by
/// injection, so tests can stand the whole stack up against a scratch
/// database (or swap the mailer) without touching globals.
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityService,
    pub content: ContentService,
    pub groups: GroupService,
    pub lookups: LookupService,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(pool: PgPool, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            identity: IdentityService::new(pool.clone()),
            content: ContentService::new(pool.clone()),
            groups: GroupService::new(pool.clone()),
            lookups: LookupService::new(pool),
            mailer,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Auth required
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use crate::handlers::{auth, comments, posts};

    Router::new()
        .route("/get_posts", get(posts::get_posts).post(posts::filter_posts))
        .route("/view_comments/:post_id", get(comments::view_comments))
        .route("/register", get(auth::register_page).post(auth::register))
        .route(
            "/register/:token",
            get(auth::register_with_token_page).post(auth::register_with_token),
        )
        .route(
            "/reg_confirmation",
            get(auth::reg_confirmation_page).post(auth::reg_confirmation),
        )
        .route("/login", get(auth::login_page).post(auth::login))
        .route(
            "/forgot_password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/reset_password/:token",
            get(auth::reset_password_page).post(auth::reset_password),
        )
}

fn protected_routes() -> Router<AppState> {
    use crate::handlers::{auth, comments, groups, posts, profiles};

    Router::new()
        .route("/logout", get(auth::logout))
        // Posts
        .route("/make_post", get(posts::make_post_page).post(posts::make_post))
        .route(
            "/edit_post/:post_id",
            get(posts::edit_post_page).post(posts::edit_post),
        )
        .route("/delete_post/:post_id", get(posts::delete_post))
        // Comments
        .route(
            "/comment/:post_id",
            get(comments::comment_page).post(comments::create_comment),
        )
        .route(
            "/edit_comment/:comment_id",
            get(comments::edit_comment_page).post(comments::edit_comment),
        )
        .route("/delete_comment/:comment_id", get(comments::delete_comment))
        // Profiles and user admin
        .route("/profile/:username", get(profiles::profile))
        .route(
            "/edit_profile/:username",
            get(profiles::edit_profile_page).post(profiles::edit_profile),
        )
        .route("/delete_profile/:username", get(profiles::delete_profile))
        .route(
            "/view_users",
            get(profiles::view_users).post(profiles::assign_role),
        )
        // Groups
        .route("/get_groups", get(groups::get_groups).post(groups::get_groups))
        .route("/add_group", get(groups::add_group_page).post(groups::add_group))
        .route("/add_student/:username", axum::routing::post(groups::add_student))
        .route(
            "/remove_student/:group_id/:username",
            get(groups::remove_student),
        )
        .route(
            "/edit_group/:group_id",
            get(groups::edit_group_page).post(groups::edit_group),
        )
        .route("/delete_group/:group_id", get(groups::delete_group))
        // route_layer keeps the guard off the fallback: unmatched paths
        // still answer a plain 404 instead of bouncing to /login.
        .route_layer(axum::middleware::from_fn(middleware::auth::login_required))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "TutorHub API",
            "version": version,
            "description": "Community Q&A and tutoring-group backend built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "posts": "/get_posts (public), /make_post, /edit_post/:id, /delete_post/:id",
                "comments": "/view_comments/:id (public), /comment/:id, /edit_comment/:id, /delete_comment/:id",
                "auth": "/register, /login, /logout, /forgot_password, /reset_password/:token, /reg_confirmation, /register/:token",
                "profiles": "/profile/:username, /edit_profile/:username, /delete_profile/:username, /view_users (Admin/Tutor)",
                "groups": "/get_groups, /add_group, /add_student/:username, /remove_student/:group/:username, /edit_group/:id, /delete_group/:id",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
