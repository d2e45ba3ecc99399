use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::api::flash::{flash_redirect, SESSION_COOKIE};
use crate::auth::validate_session_jwt;
use crate::policy::Principal;

/// Login-required middleware: validates the session JWT and injects the
/// authenticated `Principal` into the request. Anonymous requests are sent
/// to the login page with a message, mirroring the rest of the
/// redirect-plus-flash contract.
pub async fn login_required(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    match principal_from_headers(&headers) {
        Some(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        None => flash_redirect("/login", "Please log in to continue."),
    }
}

/// Best-effort principal resolution for public pages (post listings show
/// group filters only to logged-in users). Invalid or absent credentials
/// simply mean "anonymous" here.
pub fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    let token = bearer_token(headers).or_else(|| session_cookie_token(headers))?;
    validate_session_jwt(&token).ok().map(Principal::from)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn session_cookie_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some(value) = pair.strip_prefix(SESSION_COOKIE).and_then(|rest| rest.strip_prefix('=')) {
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    use crate::auth::{generate_session_jwt, Claims};
    use crate::database::models::Role;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn extracts_session_from_cookie() {
        let token = generate_session_jwt(Claims::new("alice".into(), Some(Role::Student))).unwrap();
        let headers = headers_with_cookie(&format!("other=1; session={}", token));

        let principal = principal_from_headers(&headers).unwrap();
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.role, Some(Role::Student));
    }

    #[test]
    fn extracts_session_from_bearer_header() {
        let token = generate_session_jwt(Claims::new("bob".into(), None)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        assert_eq!(principal_from_headers(&headers).unwrap().username, "bob");
    }

    #[test]
    fn garbage_tokens_mean_anonymous() {
        let headers = headers_with_cookie("session=not-a-jwt");
        assert!(principal_from_headers(&headers).is_none());
        assert!(principal_from_headers(&HeaderMap::new()).is_none());
    }
}
