// Domain error type shared by the stores and the request layer.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use crate::api::flash::flash_redirect;
use crate::database::manager::DatabaseError;

/// Errors a handler can surface.
///
/// Domain failures (missing resource, failed policy check, stale token) are
/// recoverable by design: they carry the listing or entry page the user is
/// sent back to, and render as a 303 plus flash message rather than an error
/// status. Storage failures are logged and answered with a plain 500 -
/// "not found" and "storage broke" are deliberately distinct kinds here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    NotFound { message: String, redirect: String },

    #[error("You are not authorized to do this.")]
    Unauthorized { redirect: String },

    #[error("{message}")]
    Conflict { message: String, redirect: String },

    #[error("{message}")]
    Validation { message: String, redirect: String },

    #[error("This link has expired.")]
    TokenExpired { redirect: String },

    #[error("This link is not valid.")]
    TokenInvalid { redirect: String },

    #[error(transparent)]
    Storage(#[from] sqlx::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        AppError::NotFound {
            message: message.into(),
            redirect: redirect.into(),
        }
    }

    /// Failed policy check. The acting user is bounced to their own profile.
    pub fn unauthorized(principal_username: &str) -> Self {
        AppError::Unauthorized {
            redirect: format!("/profile/{}", principal_username),
        }
    }

    pub fn conflict(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        AppError::Conflict {
            message: message.into(),
            redirect: redirect.into(),
        }
    }

    pub fn validation(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            redirect: redirect.into(),
        }
    }
}

impl From<crate::services::ContentError> for AppError {
    fn from(err: crate::services::ContentError) -> Self {
        use crate::services::ContentError;
        match err {
            ContentError::PostNotFound => AppError::not_found("Post Not Found", "/get_posts"),
            ContentError::CommentNotFound => {
                AppError::not_found("Comment Not Found", "/get_posts")
            }
            ContentError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl From<crate::services::GroupError> for AppError {
    fn from(err: crate::services::GroupError) -> Self {
        use crate::services::GroupError;
        match err {
            GroupError::GroupNotFound => AppError::not_found("Group Not Found", "/get_groups"),
            GroupError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl From<crate::services::IdentityError> for AppError {
    fn from(err: crate::services::IdentityError) -> Self {
        use crate::services::IdentityError;
        match err {
            IdentityError::UserNotFound => AppError::not_found("User Not Found", "/get_posts"),
            IdentityError::UsernameTaken => {
                AppError::conflict("Username already exists", "/login")
            }
            IdentityError::Hash(msg) => AppError::Internal(msg),
            IdentityError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound { message, redirect }
            | AppError::Conflict { message, redirect }
            | AppError::Validation { message, redirect } => flash_redirect(&redirect, &message),

            AppError::Unauthorized { redirect } => {
                flash_redirect(&redirect, "You are not authorized to do this.")
            }

            AppError::TokenExpired { redirect } => {
                flash_redirect(&redirect, "This link has expired. Please request a new one.")
            }

            AppError::TokenInvalid { redirect } => {
                flash_redirect(&redirect, "This link is not valid.")
            }

            AppError::Storage(e) => {
                tracing::error!("storage error: {}", e);
                internal_error_response()
            }

            AppError::Database(e) => {
                tracing::error!("database error: {}", e);
                internal_error_response()
            }

            AppError::Internal(message) => {
                tracing::error!("internal error: {}", message);
                internal_error_response()
            }
        }
    }
}

fn internal_error_response() -> Response {
    // Don't expose internal errors to clients
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "An error occurred while processing your request"
        })),
    )
        .into_response()
}
