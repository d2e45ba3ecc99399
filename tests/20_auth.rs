mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn anonymous_request_to_protected_route_redirects_to_login() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = common::client()?;

    let resp = client
        .get(format!("{}/make_post", server.base_url))
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp).as_deref(), Some("/login"));
    assert!(common::flash_cookie(&resp).is_some());

    Ok(())
}

#[tokio::test]
async fn register_establishes_session_and_redirects_to_profile() -> Result<()> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }

    let server = common::ensure_server().await?;
    let client = common::client()?;
    let username = common::unique("reg");

    let resp = client
        .post(format!("{}/register", server.base_url))
        .form(&[("username", username.as_str()), ("password", "hunter22")])
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        common::location(&resp).as_deref(),
        Some(format!("/profile/{}", username).as_str())
    );

    let session = common::session_cookie(&resp).expect("registration should set a session");

    // The session cookie authenticates follow-up requests.
    let resp = client
        .get(format!("{}/profile/{}", server.base_url, username))
        .header(reqwest::header::COOKIE, &session)
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"]["user"]["username"], serde_json::json!(username));

    Ok(())
}

#[tokio::test]
async fn login_rejects_a_bad_password_without_detail() -> Result<()> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }

    let server = common::ensure_server().await?;
    let client = common::client()?;
    let username = common::unique("badpw");

    client
        .post(format!("{}/register", server.base_url))
        .form(&[("username", username.as_str()), ("password", "right-one")])
        .send()
        .await?;

    let resp = client
        .post(format!("{}/login", server.base_url))
        .form(&[("username", username.as_str()), ("password", "wrong-one")])
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp).as_deref(), Some("/login"));
    assert!(common::session_cookie(&resp).is_none());

    Ok(())
}

#[tokio::test]
async fn usernames_are_case_normalized_at_login() -> Result<()> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }

    let server = common::ensure_server().await?;
    let client = common::client()?;
    let username = common::unique("case");

    client
        .post(format!("{}/register", server.base_url))
        .form(&[("username", username.as_str()), ("password", "hunter22")])
        .send()
        .await?;

    let shouty = username.to_uppercase();
    let resp = client
        .post(format!("{}/login", server.base_url))
        .form(&[("username", shouty.as_str()), ("password", "hunter22")])
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        common::location(&resp).as_deref(),
        Some(format!("/profile/{}", username).as_str())
    );
    assert!(common::session_cookie(&resp).is_some());

    Ok(())
}

#[tokio::test]
async fn duplicate_registration_is_bounced_to_login() -> Result<()> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }

    let server = common::ensure_server().await?;
    let client = common::client()?;
    let username = common::unique("dupe");

    let resp = client
        .post(format!("{}/register", server.base_url))
        .form(&[("username", username.as_str()), ("password", "hunter22")])
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    // Second attempt lands on /login with no session.
    let resp = client
        .post(format!("{}/register", server.base_url))
        .form(&[("username", username.as_str()), ("password", "hunter22")])
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp).as_deref(), Some("/login"));
    assert!(common::session_cookie(&resp).is_none());

    Ok(())
}

#[tokio::test]
async fn logout_clears_the_session() -> Result<()> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }

    let server = common::ensure_server().await?;
    let client = common::client()?;
    let username = common::unique("out");

    let resp = client
        .post(format!("{}/register", server.base_url))
        .form(&[("username", username.as_str()), ("password", "hunter22")])
        .send()
        .await?;
    let session = common::session_cookie(&resp).expect("registration should set a session");

    let resp = client
        .get(format!("{}/logout", server.base_url))
        .header(reqwest::header::COOKIE, &session)
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp).as_deref(), Some("/login"));

    // The logout response overwrites the session cookie with an empty value.
    let cleared = common::session_cookie(&resp).expect("logout should reset the session cookie");
    assert_eq!(cleared, "session=");

    Ok(())
}

#[tokio::test]
async fn forgot_password_answers_uniformly() -> Result<()> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }

    let server = common::ensure_server().await?;
    let client = common::client()?;

    // Same redirect whether or not the address is known.
    let resp = client
        .post(format!("{}/forgot_password", server.base_url))
        .form(&[("email", "nobody@example.invalid")])
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp).as_deref(), Some("/login"));

    Ok(())
}
