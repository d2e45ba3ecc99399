use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use serde_json::json;

use crate::api::flash::flash_redirect;
use crate::api::ok_json;
use crate::error::AppError;
use crate::middleware::auth::principal_from_headers;
use crate::policy::{can_mutate, Principal};
use crate::services::PostFilter;
use crate::AppState;

use super::{non_empty, parse_id, parse_optional_group};

#[derive(Debug, Deserialize)]
pub struct PostListForm {
    pub category: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub category: Option<String>,
    pub group: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// GET /get_posts - public listing. Group filters are only offered to
/// logged-in users, scoped to what their role may see.
pub async fn get_posts(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    list_posts_response(&state, &headers, PostFilter::default()).await
}

/// POST /get_posts - the filter form submission.
pub async fn filter_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<PostListForm>,
) -> Result<Response, AppError> {
    let filter = PostFilter {
        category: non_empty(form.category),
        group_id: parse_optional_group(form.group),
    };
    list_posts_response(&state, &headers, filter).await
}

async fn list_posts_response(
    state: &AppState,
    headers: &HeaderMap,
    filter: PostFilter,
) -> Result<Response, AppError> {
    let posts = state.content.list_posts(&filter).await?;
    let categories = state.lookups.categories().await?;

    let groups = match principal_from_headers(headers) {
        Some(principal) => state.groups.list_groups_for(&principal).await?,
        None => Vec::new(),
    };

    Ok(ok_json(json!({
        "posts": posts,
        "categories": categories,
        "groups": groups,
        "query": {
            "category": filter.category,
            "group_id": filter.group_id,
        },
    }))
    .into_response())
}

/// GET /make_post - data backing the new-post form.
pub async fn make_post_page(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, AppError> {
    let categories = state.lookups.categories().await?;
    let groups = state.groups.list_groups_for(&principal).await?;

    Ok(ok_json(json!({ "categories": categories, "groups": groups })).into_response())
}

/// POST /make_post
pub async fn make_post(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    state
        .content
        .create_post(
            &principal.username,
            non_empty(form.category),
            parse_optional_group(form.group),
            form.title.as_deref().unwrap_or(""),
            form.description.as_deref().unwrap_or(""),
        )
        .await?;

    Ok(flash_redirect("/get_posts", "Post Published"))
}

/// GET /edit_post/:post_id
pub async fn edit_post_page(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(post_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&post_id, "Post Not Found", "/get_posts")?;
    let post = state
        .content
        .find_post(id)
        .await?
        .ok_or_else(|| AppError::not_found("Post Not Found", "/get_posts"))?;

    if !can_mutate(&principal, &post.username) {
        return Err(AppError::unauthorized(&principal.username));
    }

    let categories = state.lookups.categories().await?;
    let groups = state.groups.list_groups_for(&principal).await?;

    Ok(ok_json(json!({
        "post": post,
        "categories": categories,
        "groups": groups,
    }))
    .into_response())
}

/// POST /edit_post/:post_id - full replace of the mutable fields;
/// comment_count is preserved by the store.
pub async fn edit_post(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(post_id): Path<String>,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&post_id, "Post Not Found", "/get_posts")?;
    let post = state
        .content
        .find_post(id)
        .await?
        .ok_or_else(|| AppError::not_found("Post Not Found", "/get_posts"))?;

    if !can_mutate(&principal, &post.username) {
        return Err(AppError::unauthorized(&principal.username));
    }

    // The post keeps its original author even when an admin edits it.
    state
        .content
        .update_post(
            id,
            &post.username,
            non_empty(form.category),
            parse_optional_group(form.group),
            form.title.as_deref().unwrap_or(""),
            form.description.as_deref().unwrap_or(""),
        )
        .await?;

    Ok(flash_redirect("/get_posts", "Post Updated"))
}

/// GET /delete_post/:post_id - cascades to the post's comments.
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(post_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&post_id, "Post Not Found", "/get_posts")?;
    let post = state
        .content
        .find_post(id)
        .await?
        .ok_or_else(|| AppError::not_found("Post Not Found", "/get_posts"))?;

    if !can_mutate(&principal, &post.username) {
        return Err(AppError::unauthorized(&principal.username));
    }

    state.content.delete_post(id).await?;

    Ok(flash_redirect("/get_posts", "Post Deleted"))
}
