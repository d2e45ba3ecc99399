use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config;

pub const FLASH_COOKIE: &str = "flash";
pub const SESSION_COOKIE: &str = "session";

/// Redirect-after-POST with a transient user-facing message. Every mutation
/// and every recoverable domain failure answers with this shape: 303 plus a
/// short-lived flash cookie the front end consumes on the next page load.
pub fn flash_redirect(location: &str, message: &str) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    set_header(&mut response, header::LOCATION, &encode_location(location));
    append_cookie(&mut response, &flash_cookie(message));
    response
}

/// As `flash_redirect`, additionally establishing a logged-in session.
pub fn flash_redirect_with_session(location: &str, message: &str, token: &str) -> Response {
    let mut response = flash_redirect(location, message);
    append_cookie(&mut response, &session_cookie(token));
    response
}

/// As `flash_redirect`, additionally tearing the session down.
pub fn flash_redirect_logout(location: &str, message: &str) -> Response {
    let mut response = flash_redirect(location, message);
    append_cookie(&mut response, &clear_session_cookie());
    response
}

pub fn flash_cookie(message: &str) -> String {
    format!(
        "{}={}; Path=/; Max-Age=60",
        FLASH_COOKIE,
        cookie_encode(message)
    )
}

pub fn session_cookie(token: &str) -> String {
    let max_age = config::config().security.session_expiry_hours * 3600;
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    )
}

pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

fn set_header(response: &mut Response, name: header::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        response.headers_mut().insert(name, value);
    }
}

fn append_cookie(response: &mut Response, cookie: &str) {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

/// Percent-encode a redirect target so it is always a valid header value,
/// leaving the path structure and any query string intact. Redirects carry
/// usernames in path segments, and usernames are not restricted to ASCII.
fn encode_location(location: &str) -> String {
    let mut out = String::with_capacity(location.len());
    for byte in location.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/'
            | b'?' | b'&' | b'=' | b'%' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Percent-encode a message so it is always a valid cookie value.
fn cookie_encode(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for byte in message.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{LOCATION, SET_COOKIE};

    #[test]
    fn encodes_spaces_and_punctuation() {
        assert_eq!(cookie_encode("Post Published"), "Post%20Published");
        assert_eq!(cookie_encode("Croeso, alice"), "Croeso%2C%20alice");
        assert_eq!(cookie_encode("plain-text_1.0~"), "plain-text_1.0~");
    }

    #[test]
    fn non_ascii_redirect_targets_still_carry_a_location() {
        let response = flash_redirect("/profile/siân", "Croeso, siân");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/profile/si%C3%A2n"
        );
    }

    #[test]
    fn redirect_carries_location_and_flash() {
        let response = flash_redirect("/get_posts", "Post Deleted");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/get_posts");

        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("flash=Post%20Deleted"));
        assert!(cookie.contains("Max-Age=60"));
    }

    #[test]
    fn login_redirect_sets_both_cookies() {
        let response = flash_redirect_with_session("/profile/alice", "Croeso, alice", "tok");
        let cookies: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[1].to_str().unwrap().starts_with("session=tok"));
        assert!(cookies[1].to_str().unwrap().contains("HttpOnly"));
    }

    #[test]
    fn logout_clears_the_session() {
        let response = flash_redirect_logout("/login", "Logged out");
        let cookies: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert!(cookies[1].to_str().unwrap().contains("Max-Age=0"));
    }
}
