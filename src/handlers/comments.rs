use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use serde_json::json;

use crate::api::flash::flash_redirect;
use crate::api::ok_json;
use crate::error::AppError;
use crate::policy::{can_mutate, Principal};
use crate::AppState;

use super::parse_id;

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub text: Option<String>,
}

/// GET /view_comments/:post_id - public: a post with its comments. The
/// denormalized comment_count rides along on the post itself.
pub async fn view_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&post_id, "Post Not Found", "/get_posts")?;
    let post = state
        .content
        .find_post(id)
        .await?
        .ok_or_else(|| AppError::not_found("Post Not Found", "/get_posts"))?;

    let comments = state.content.comments_for_post(id).await?;

    Ok(ok_json(json!({
        "post": post,
        "comments": comments,
        "comment_count": post.comment_count,
    }))
    .into_response())
}

/// GET /comment/:post_id - data backing the comment form.
pub async fn comment_page(
    State(state): State<AppState>,
    Extension(_principal): Extension<Principal>,
    Path(post_id): Path<String>,
) -> Result<Response, AppError> {
    view_comments(State(state), Path(post_id)).await
}

/// POST /comment/:post_id - create a comment; the post's comment_count is
/// incremented atomically with the insert.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&post_id, "Post Not Found", "/get_posts")?;

    state
        .content
        .create_comment(id, form.text.as_deref().unwrap_or(""), &principal.username)
        .await?;

    Ok(flash_redirect(
        &format!("/view_comments/{}", id),
        "Comment added",
    ))
}

/// GET /edit_comment/:comment_id
pub async fn edit_comment_page(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(comment_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&comment_id, "Comment Not Found", "/get_posts")?;
    let comment = state
        .content
        .find_comment(id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment Not Found", "/get_posts"))?;

    if !can_mutate(&principal, &comment.username) {
        return Err(AppError::unauthorized(&principal.username));
    }

    Ok(ok_json(json!({ "comment": comment })).into_response())
}

/// POST /edit_comment/:comment_id - only the text changes; authorship and
/// the post reference are fixed at creation.
pub async fn edit_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(comment_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&comment_id, "Comment Not Found", "/get_posts")?;
    let comment = state
        .content
        .find_comment(id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment Not Found", "/get_posts"))?;

    if !can_mutate(&principal, &comment.username) {
        return Err(AppError::unauthorized(&principal.username));
    }

    state
        .content
        .update_comment(id, form.text.as_deref().unwrap_or(""))
        .await?;

    Ok(flash_redirect(
        &format!("/view_comments/{}", comment.post_id),
        "Comment updated",
    ))
}

/// GET /delete_comment/:comment_id - the post's comment_count is
/// decremented atomically with the delete.
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(comment_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&comment_id, "Comment Not Found", "/get_posts")?;
    let comment = state
        .content
        .find_comment(id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment Not Found", "/get_posts"))?;

    if !can_mutate(&principal, &comment.username) {
        return Err(AppError::unauthorized(&principal.username));
    }

    let deleted = state.content.delete_comment(id).await?;

    Ok(flash_redirect(
        &format!("/view_comments/{}", deleted.post_id),
        "Comment deleted",
    ))
}
