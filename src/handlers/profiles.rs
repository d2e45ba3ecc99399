use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use serde_json::json;

use crate::api::flash::{flash_redirect, flash_redirect_logout};
use crate::api::ok_json;
use crate::database::models::user::normalize_username;
use crate::database::models::Role;
use crate::error::AppError;
use crate::policy::{can_manage_groups, can_mutate, Principal};
use crate::AppState;

use super::non_empty;

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub email: Option<String>,
    pub level: Option<String>,
    pub provider: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub username: Option<String>,
    pub role: Option<String>,
}

/// GET /profile/:username - a user's profile with their posts. Only the
/// owner (or an admin) may view it; others are bounced to their own.
pub async fn profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let username = normalize_username(&username);
    if !can_mutate(&principal, &username) {
        return Err(AppError::unauthorized(&principal.username));
    }

    let user = state
        .identity
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("User Not Found", "/get_posts"))?;

    let posts = state.content.list_posts_by_username(&username).await?;

    Ok(ok_json(json!({ "user": user, "posts": posts })).into_response())
}

/// GET /edit_profile/:username
pub async fn edit_profile_page(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let username = normalize_username(&username);
    let user = state
        .identity
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("User Not Found", "/get_posts"))?;

    if !can_mutate(&principal, &username) {
        return Err(AppError::unauthorized(&principal.username));
    }

    let levels = state.lookups.levels().await?;
    let providers = state.lookups.providers().await?;

    Ok(ok_json(json!({
        "user": user,
        "levels": levels,
        "providers": providers,
    }))
    .into_response())
}

/// POST /edit_profile/:username
pub async fn edit_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(username): Path<String>,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let username = normalize_username(&username);
    let user = state
        .identity
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("User Not Found", "/get_posts"))?;

    if !can_mutate(&principal, &user.username) {
        return Err(AppError::unauthorized(&principal.username));
    }

    state
        .identity
        .update_profile(
            &username,
            non_empty(form.email),
            non_empty(form.level),
            non_empty(form.provider),
            non_empty(form.location),
            non_empty(form.bio),
        )
        .await?;

    Ok(flash_redirect(
        &format!("/profile/{}", username),
        "Profile updated",
    ))
}

/// GET /delete_profile/:username - cascades through the user's comments,
/// posts, and tutored groups before removing the account.
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let username = normalize_username(&username);
    let user = state
        .identity
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("User Not Found", "/get_posts"))?;

    if !can_mutate(&principal, &user.username) {
        return Err(AppError::unauthorized(&principal.username));
    }

    state.identity.delete_user(&username).await?;

    if principal.username == username {
        // Self-deletion also ends the session.
        Ok(flash_redirect_logout("/register", "Account deleted"))
    } else {
        Ok(flash_redirect("/view_users", "User deleted"))
    }
}

/// GET /view_users - the admin/tutor user directory.
pub async fn view_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, AppError> {
    if !can_manage_groups(&principal) {
        return Err(AppError::unauthorized(&principal.username));
    }

    let users = state.identity.list_users().await?;
    let roles = state.lookups.roles().await?;

    Ok(ok_json(json!({ "users": users, "roles": roles })).into_response())
}

/// POST /view_users - role assignment. Tutors may browse the directory but
/// only admins may change roles.
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Form(form): Form<RoleForm>,
) -> Result<Response, AppError> {
    if !principal.is_admin() {
        return Err(AppError::unauthorized(&principal.username));
    }

    let Some(username) = non_empty(form.username) else {
        return Ok(flash_redirect("/view_users", "User Not Specified"));
    };

    let role: Role = match form.role.as_deref().unwrap_or("").parse() {
        Ok(role) => role,
        Err(()) => {
            return Err(AppError::validation("Unknown role", "/view_users"));
        }
    };

    state
        .identity
        .set_role(&username, role)
        .await
        .map_err(|e| match e {
            crate::services::IdentityError::UserNotFound => {
                AppError::not_found("User Not Found", "/view_users")
            }
            other => other.into(),
        })?;

    Ok(flash_redirect("/view_users", "Role updated"))
}
