use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use serde_json::json;

use crate::api::flash::{flash_redirect, flash_redirect_logout, flash_redirect_with_session};
use crate::api::ok_json;
use crate::auth::tokens::{self, TokenError, TokenPurpose};
use crate::auth::{generate_session_jwt, Claims};
use crate::config;
use crate::database::models::user::normalize_username;
use crate::database::models::User;
use crate::error::AppError;
use crate::mail::OutboundMail;
use crate::middleware::auth::principal_from_headers;
use crate::policy::Principal;
use crate::AppState;

use super::non_empty;

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailForm {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub password: Option<String>,
}

/// GET /register
pub async fn register_page(headers: HeaderMap) -> Response {
    if principal_from_headers(&headers).is_some() {
        return flash_redirect("/get_posts", "You are already logged in");
    }
    ok_json(json!({})).into_response()
}

/// POST /register - direct registration. New accounts get the configured
/// default role.
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let Some(username) = non_empty(form.username) else {
        return Ok(flash_redirect("/register", "Username is required"));
    };
    let Some(password) = non_empty(form.password) else {
        return Ok(flash_redirect("/register", "Password is required"));
    };

    if state.identity.find_by_username(&username).await?.is_some() {
        return Ok(flash_redirect("/login", "Username already exists"));
    }

    let user = state
        .identity
        .create_user(&username, &password, non_empty(form.email))
        .await?;

    establish_session(&user, "Registration Successful!")
}

/// GET /login
pub async fn login_page(headers: HeaderMap) -> Response {
    if principal_from_headers(&headers).is_some() {
        return flash_redirect("/get_posts", "You are already logged in");
    }
    ok_json(json!({})).into_response()
}

/// POST /login - the failure message never says whether the username or the
/// password was wrong.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let username = normalize_username(form.username.as_deref().unwrap_or(""));
    let password = form.password.unwrap_or_default();

    let Some(user) = state.identity.find_by_username(&username).await? else {
        return Ok(flash_redirect("/login", "Incorrect username and/or password"));
    };

    if !state.identity.verify_password(&user, &password) {
        return Ok(flash_redirect("/login", "Incorrect username and/or password"));
    }

    let greeting = format!("Croeso, {}", user.username);
    establish_session(&user, &greeting)
}

/// GET /logout
pub async fn logout(Extension(_principal): Extension<Principal>) -> Response {
    flash_redirect_logout("/login", "Logged out")
}

/// GET /forgot_password
pub async fn forgot_password_page() -> Response {
    ok_json(json!({})).into_response()
}

/// POST /forgot_password - always answers the same way, so the form cannot
/// be used to probe which addresses are registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<EmailForm>,
) -> Result<Response, AppError> {
    if let Some(email) = non_empty(form.email) {
        if state.identity.find_by_email(&email).await?.is_some() {
            let token = tokens::issue(&email, TokenPurpose::PasswordReset)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            send_link_mail(
                &state,
                &email,
                "Reset your password",
                &format!("/reset_password/{}", token),
            )
            .await;
        }
    }

    Ok(flash_redirect(
        "/login",
        "If that address is registered, a reset link is on its way",
    ))
}

/// GET /reset_password/:token - validates before offering the form, so an
/// expired link fails here rather than after the user typed a new password.
pub async fn reset_password_page(Path(token): Path<String>) -> Result<Response, AppError> {
    let email = verify_mail_token(&token, TokenPurpose::PasswordReset, "/forgot_password")?;
    Ok(ok_json(json!({ "email": email })).into_response())
}

/// POST /reset_password/:token
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<PasswordForm>,
) -> Result<Response, AppError> {
    let email = verify_mail_token(&token, TokenPurpose::PasswordReset, "/forgot_password")?;

    let Some(password) = non_empty(form.password) else {
        return Ok(flash_redirect(
            &format!("/reset_password/{}", token),
            "Password is required",
        ));
    };

    state.identity.set_password_by_email(&email, &password).await?;

    Ok(flash_redirect("/login", "Password updated. Please log in."))
}

/// GET /reg_confirmation
pub async fn reg_confirmation_page() -> Response {
    ok_json(json!({})).into_response()
}

/// POST /reg_confirmation - start of the email-confirmed registration flow.
pub async fn reg_confirmation(
    State(state): State<AppState>,
    Form(form): Form<EmailForm>,
) -> Result<Response, AppError> {
    let Some(email) = non_empty(form.email) else {
        return Ok(flash_redirect("/reg_confirmation", "Email is required"));
    };

    let token = tokens::issue(&email, TokenPurpose::Registration)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    send_link_mail(
        &state,
        &email,
        "Confirm your registration",
        &format!("/register/{}", token),
    )
    .await;

    Ok(flash_redirect(
        "/login",
        "Confirmation email sent. Check your inbox.",
    ))
}

/// GET /register/:token - completes on POST; the account's email comes from
/// the verified token payload, not the form.
pub async fn register_with_token_page(Path(token): Path<String>) -> Result<Response, AppError> {
    let email = verify_mail_token(&token, TokenPurpose::Registration, "/reg_confirmation")?;
    Ok(ok_json(json!({ "email": email })).into_response())
}

/// POST /register/:token
pub async fn register_with_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let email = verify_mail_token(&token, TokenPurpose::Registration, "/reg_confirmation")?;

    let Some(username) = non_empty(form.username) else {
        return Ok(flash_redirect(
            &format!("/register/{}", token),
            "Username is required",
        ));
    };
    let Some(password) = non_empty(form.password) else {
        return Ok(flash_redirect(
            &format!("/register/{}", token),
            "Password is required",
        ));
    };

    if state.identity.find_by_username(&username).await?.is_some() {
        return Ok(flash_redirect("/login", "Username already exists"));
    }

    let user = state
        .identity
        .create_user(&username, &password, Some(email))
        .await?;

    establish_session(&user, "Registration Successful!")
}

fn establish_session(user: &User, message: &str) -> Result<Response, AppError> {
    let token = generate_session_jwt(Claims::new(user.username.clone(), user.role()))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(flash_redirect_with_session(
        &format!("/profile/{}", user.username),
        message,
        &token,
    ))
}

fn verify_mail_token(
    token: &str,
    purpose: TokenPurpose,
    retry_redirect: &str,
) -> Result<String, AppError> {
    tokens::verify(token, purpose).map_err(|e| match e {
        TokenError::Expired => AppError::TokenExpired {
            redirect: retry_redirect.to_string(),
        },
        TokenError::Invalid => AppError::TokenInvalid {
            redirect: retry_redirect.to_string(),
        },
    })
}

/// Mail delivery is best-effort from the requester's point of view: a
/// transport failure is logged, never surfaced as a request error.
async fn send_link_mail(state: &AppState, to: &str, subject: &str, path: &str) {
    let link = format!("{}{}", config::config().server.base_url, path);
    let mail = OutboundMail {
        to: to.to_string(),
        subject: subject.to_string(),
        body: format!("Follow this link to continue: {}", link),
    };

    if let Err(e) = state.mailer.send(mail).await {
        tracing::error!("failed to send mail to {}: {}", to, e);
    }
}
