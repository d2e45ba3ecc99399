use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use serde_json::json;

use crate::api::flash::flash_redirect;
use crate::api::ok_json;
use crate::database::models::user::normalize_username;
use crate::error::AppError;
use crate::policy::{can_manage_groups, can_mutate, Principal};
use crate::AppState;

use super::{non_empty, parse_id};

#[derive(Debug, Deserialize)]
pub struct GroupForm {
    pub provider: Option<String>,
    pub level: Option<String>,
    pub year: Option<String>,
    pub weekday: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddStudentForm {
    pub group_id: Option<String>,
}

/// GET /get_groups - groups visible to the principal per role scope.
pub async fn get_groups(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, AppError> {
    let groups = state.groups.list_groups_for(&principal).await?;
    Ok(ok_json(json!({ "groups": groups })).into_response())
}

/// GET /add_group - data backing the new-group form.
pub async fn add_group_page(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, AppError> {
    if !can_manage_groups(&principal) {
        return Err(AppError::unauthorized(&principal.username));
    }

    let providers = state.lookups.providers().await?;
    let levels = state.lookups.levels().await?;

    Ok(ok_json(json!({ "providers": providers, "levels": levels })).into_response())
}

/// POST /add_group - the acting tutor owns the new group.
pub async fn add_group(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Form(form): Form<GroupForm>,
) -> Result<Response, AppError> {
    if !can_manage_groups(&principal) {
        return Err(AppError::unauthorized(&principal.username));
    }

    state
        .groups
        .create_group(
            &principal.username,
            non_empty(form.provider),
            non_empty(form.level),
            non_empty(form.year),
            non_empty(form.weekday),
        )
        .await?;

    Ok(flash_redirect("/get_groups", "Group created"))
}

/// POST /add_student/:username - membership add with set semantics.
pub async fn add_student(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(username): Path<String>,
    Form(form): Form<AddStudentForm>,
) -> Result<Response, AppError> {
    if !can_manage_groups(&principal) {
        return Err(AppError::unauthorized(&principal.username));
    }

    let group_id = form
        .group_id
        .as_deref()
        .ok_or_else(|| AppError::not_found("Group Not Specified", "/get_groups"))?;
    let id = parse_id(group_id, "Group Not Found", "/get_groups")?;

    let group = state
        .groups
        .find_group(id)
        .await?
        .ok_or_else(|| AppError::not_found("Group Not Found", "/get_groups"))?;

    // Tutors only manage their own groups; admins manage any.
    if !can_mutate(&principal, &group.tutor) {
        return Err(AppError::unauthorized(&principal.username));
    }

    state
        .groups
        .add_student(id, &normalize_username(&username))
        .await?;

    Ok(flash_redirect("/get_groups", "Student added"))
}

/// GET /remove_student/:group_id/:username
pub async fn remove_student(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((group_id, username)): Path<(String, String)>,
) -> Result<Response, AppError> {
    if !can_manage_groups(&principal) {
        return Err(AppError::unauthorized(&principal.username));
    }

    let id = parse_id(&group_id, "Group Not Found", "/get_groups")?;
    let group = state
        .groups
        .find_group(id)
        .await?
        .ok_or_else(|| AppError::not_found("Group Not Found", "/get_groups"))?;

    if !can_mutate(&principal, &group.tutor) {
        return Err(AppError::unauthorized(&principal.username));
    }

    state
        .groups
        .remove_student(id, &normalize_username(&username))
        .await?;

    Ok(flash_redirect("/get_groups", "Student removed"))
}

/// GET /edit_group/:group_id
pub async fn edit_group_page(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(group_id): Path<String>,
) -> Result<Response, AppError> {
    if !can_manage_groups(&principal) {
        return Err(AppError::unauthorized(&principal.username));
    }

    let id = parse_id(&group_id, "Group Not Found", "/get_groups")?;
    let group = state
        .groups
        .find_group(id)
        .await?
        .ok_or_else(|| AppError::not_found("Group Not Found", "/get_groups"))?;

    if !can_mutate(&principal, &group.tutor) {
        return Err(AppError::unauthorized(&principal.username));
    }

    let providers = state.lookups.providers().await?;
    let levels = state.lookups.levels().await?;

    Ok(ok_json(json!({
        "group": group,
        "providers": providers,
        "levels": levels,
    }))
    .into_response())
}

/// POST /edit_group/:group_id - scalar fields only; membership and tutor
/// ownership are mutated through their own operations.
pub async fn edit_group(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(group_id): Path<String>,
    Form(form): Form<GroupForm>,
) -> Result<Response, AppError> {
    if !can_manage_groups(&principal) {
        return Err(AppError::unauthorized(&principal.username));
    }

    let id = parse_id(&group_id, "Group Not Found", "/get_groups")?;
    let group = state
        .groups
        .find_group(id)
        .await?
        .ok_or_else(|| AppError::not_found("Group Not Found", "/get_groups"))?;

    if !can_mutate(&principal, &group.tutor) {
        return Err(AppError::unauthorized(&principal.username));
    }

    state
        .groups
        .update_group(
            id,
            &group.tutor,
            non_empty(form.provider),
            non_empty(form.level),
            non_empty(form.year),
            non_empty(form.weekday),
        )
        .await?;

    Ok(flash_redirect("/get_groups", "Group updated"))
}

/// GET /delete_group/:group_id - cascades to every post scoped to the group
/// (and through them, their comments).
pub async fn delete_group(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(group_id): Path<String>,
) -> Result<Response, AppError> {
    if !can_manage_groups(&principal) {
        return Err(AppError::unauthorized(&principal.username));
    }

    let id = parse_id(&group_id, "Group Not Found", "/get_groups")?;
    let group = state
        .groups
        .find_group(id)
        .await?
        .ok_or_else(|| AppError::not_found("Group Not Found", "/get_groups"))?;

    if !can_mutate(&principal, &group.tutor) {
        return Err(AppError::unauthorized(&principal.username));
    }

    state.groups.delete_group(id).await?;

    Ok(flash_redirect("/get_groups", "Group deleted"))
}
