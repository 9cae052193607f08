mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{Duration, Utc};
use restaurant_directory::{api::API_PREFIX, service::JwtService, store::UserStore};
use serde_json::json;

use common::{TestApp, PASSWORD, PUBLIC_URL};

#[tokio::test]
async fn test_register_issues_token_in_body_and_cookie() {
    let app = TestApp::new();

    let response = app
        .post(
            "/auth/register",
            None,
            json!({ "name": "Jane Diner", "email": "Jane@Example.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    let token = response.body["token"].as_str().unwrap();
    assert!(!token.is_empty());

    let cookie = response.cookie().unwrap();
    assert!(cookie.starts_with(&format!("token={}", token)));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Secure"));

    let me = app.get("/auth/me", Some(token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["email"], "jane@example.com");
    assert_eq!(me.body["data"]["role"], "user");
    assert!(me.body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = TestApp::new();
    app.register("Jane Diner", "jane@example.com", "user").await;

    let response = app
        .post(
            "/auth/register",
            None,
            json!({ "name": "Other Jane", "email": " JANE@example.com ", "password": PASSWORD }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.error(), "Email already exists");
}

#[tokio::test]
async fn test_admin_role_cannot_be_self_assigned() {
    let app = TestApp::new();

    let response = app
        .post(
            "/auth/register",
            None,
            json!({ "name": "Mallory", "email": "mallory@example.com", "password": PASSWORD, "role": "admin" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_registration_lists_failures() {
    let app = TestApp::new();

    let response = app
        .post(
            "/auth/register",
            None,
            json!({ "name": "Jane Diner", "email": "not-an-email", "password": "short" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.error().contains(','), "{}", response.error());
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let app = TestApp::new();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"email\":"))
        .unwrap();
    let response = app.send_raw(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.register("Jane Diner", "jane@example.com", "user").await;

    let unknown = app.login("nobody@example.com", PASSWORD).await;
    let wrong_password = app.login("jane@example.com", "wrong1").await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body, wrong_password.body);
    assert_eq!(unknown.error(), "Invalid credentials");

    let ok = app.login("JANE@example.com", PASSWORD).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.body["token"].is_string());
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new();
    let token = app.register("Jane Diner", "jane@example.com", "user").await;

    let response = app.get("/auth/logout", Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], json!({}));
    let cookie = response.cookie().unwrap();
    assert!(cookie.starts_with("token=none"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let app = TestApp::new();

    assert_eq!(
        app.get("/auth/me", None).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/auth/me", Some("garbage")).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_token_of_deleted_user_is_rejected() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let token = app.register("Jane Diner", "jane@example.com", "user").await;
    let user_id = app.user_id(&token).await;

    let deleted = app
        .delete(&format!("/auth/users/{}", user_id), Some(&admin))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    assert_eq!(
        app.get("/auth/me", Some(&token)).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let app = TestApp::new();
    app.register("Jane Diner", "jane@example.com", "user").await;

    let forgot = app
        .post(
            "/auth/forgotpassword",
            None,
            json!({ "email": "jane@example.com" }),
        )
        .await;
    assert_eq!(forgot.status, StatusCode::OK);
    assert_eq!(forgot.body["data"], "Email sent");

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "jane@example.com");
    assert!(sent[0]
        .text
        .contains("http://localhost:5000/api/v1/auth/resetpassword/"));

    let raw = app.mailer.last_reset_token().unwrap();
    let path = format!("/auth/resetpassword/{}", raw);

    let reset = app.post(&path, None, json!({ "password": "fresh22" })).await;
    assert_eq!(reset.status, StatusCode::OK);
    assert!(reset.body["token"].is_string());
    assert!(reset.cookie().unwrap().starts_with("token="));

    let reused = app.post(&path, None, json!({ "password": "fresh33" })).await;
    assert_eq!(reused.status, StatusCode::BAD_REQUEST);
    assert_eq!(reused.error(), "Invalid token");

    assert_eq!(
        app.login("jane@example.com", PASSWORD).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.login("jane@example.com", "fresh22").await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_reset_rejects_only_the_current_password() {
    let app = TestApp::new();
    app.register("Jane Diner", "jane@example.com", "user").await;
    app.post(
        "/auth/forgotpassword",
        None,
        json!({ "email": "jane@example.com" }),
    )
    .await;
    let path = format!(
        "/auth/resetpassword/{}",
        app.mailer.last_reset_token().unwrap()
    );

    let same = app.post(&path, None, json!({ "password": PASSWORD })).await;
    assert_eq!(same.status, StatusCode::BAD_REQUEST);

    // The rejected attempt leaves the token usable
    let different = app.post(&path, None, json!({ "password": "fresh22" })).await;
    assert_eq!(different.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_reset_token_is_invalid() {
    let app = TestApp::new();

    let response = app
        .post(
            "/auth/resetpassword/notarealtoken",
            None,
            json!({ "password": "fresh22" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), "Invalid token");
}

#[tokio::test]
async fn test_forgot_password_for_unknown_email() {
    let app = TestApp::new();

    let response = app
        .post(
            "/auth/forgotpassword",
            None,
            json!({ "email": "nobody@example.com" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_mail_failure_clears_reset_token() {
    let app = TestApp::new();
    app.register("Jane Diner", "jane@example.com", "user").await;
    app.mailer.set_failing(true);

    let response = app
        .post(
            "/auth/forgotpassword",
            None,
            json!({ "email": "jane@example.com" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error(), "Email could not be sent");

    let credentials = app
        .store
        .find_credentials_by_email("jane@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(credentials.reset_password_token.is_none());
    assert!(credentials.reset_password_expire.is_none());
}

#[tokio::test]
async fn test_reset_link_ignores_request_host() {
    let app = TestApp::new();
    app.register("Jane Diner", "jane@example.com", "user").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("{}/auth/forgotpassword", API_PREFIX))
        .header(header::HOST, "attacker.example")
        .header("X-Forwarded-Proto", "https")
        .header("X-Forwarded-Host", "attacker.example")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "email": "jane@example.com" }).to_string()))
        .unwrap();
    let response = app.send_raw(request).await;
    assert_eq!(response.status, StatusCode::OK);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0]
        .text
        .contains(&format!("{}/api/v1/auth/resetpassword/", PUBLIC_URL)));
    assert!(!sent[0].text.contains("attacker.example"));
    assert!(!sent[0]
        .html
        .as_deref()
        .unwrap_or_default()
        .contains("attacker.example"));
}

#[tokio::test]
async fn test_expired_reset_token_is_invalid() {
    let app = TestApp::new();
    app.register("Jane Diner", "jane@example.com", "user").await;
    let credentials = app
        .store
        .find_credentials_by_email("jane@example.com")
        .await
        .unwrap()
        .unwrap();

    let raw = "c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00";
    app.store
        .set_reset_token(
            credentials.id,
            Some((
                JwtService::hash_reset_token(raw),
                Utc::now() - Duration::seconds(1),
            )),
        )
        .await
        .unwrap();

    let response = app
        .post(
            &format!("/auth/resetpassword/{}", raw),
            None,
            json!({ "password": "fresh22" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), "Invalid token");

    assert_eq!(
        app.login("jane@example.com", PASSWORD).await.status,
        StatusCode::OK
    );
}

#[tokio::test(start_paused = true)]
async fn test_mail_timeout_clears_reset_token() {
    let app = TestApp::new();
    app.register("Jane Diner", "jane@example.com", "user").await;
    app.mailer.set_hanging(true);

    let response = app
        .post(
            "/auth/forgotpassword",
            None,
            json!({ "email": "jane@example.com" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error(), "Email could not be sent");
    assert!(app.mailer.sent().is_empty());

    let credentials = app
        .store
        .find_credentials_by_email("jane@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(credentials.reset_password_token.is_none());
    assert!(credentials.reset_password_expire.is_none());
}

#[tokio::test]
async fn test_update_password_checks_both_passwords() {
    let app = TestApp::new();
    let token = app.register("Jane Diner", "jane@example.com", "user").await;

    let wrong_current = app
        .put(
            "/auth/updatepassword",
            Some(&token),
            json!({ "currentPassword": "wrong1", "newPassword": "fresh22" }),
        )
        .await;
    assert_eq!(wrong_current.status, StatusCode::UNAUTHORIZED);

    let unchanged = app
        .put(
            "/auth/updatepassword",
            Some(&token),
            json!({ "currentPassword": PASSWORD, "newPassword": PASSWORD }),
        )
        .await;
    assert_eq!(unchanged.status, StatusCode::BAD_REQUEST);

    let changed = app
        .put(
            "/auth/updatepassword",
            Some(&token),
            json!({ "currentPassword": PASSWORD, "newPassword": "fresh22" }),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);
    assert!(changed.body["token"].is_string());

    assert_eq!(
        app.login("jane@example.com", "fresh22").await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_update_details_rejects_taken_email() {
    let app = TestApp::new();
    app.register("Jane Diner", "jane@example.com", "user").await;
    let token = app.register("John Diner", "john@example.com", "user").await;

    let taken = app
        .put(
            "/auth/updatedetails",
            Some(&token),
            json!({ "email": "jane@example.com" }),
        )
        .await;
    assert_eq!(taken.status, StatusCode::BAD_REQUEST);

    let renamed = app
        .put(
            "/auth/updatedetails",
            Some(&token),
            json!({ "name": "Johnny Diner" }),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["data"]["name"], "Johnny Diner");
    assert_eq!(renamed.body["data"]["email"], "john@example.com");
}

#[tokio::test]
async fn test_user_administration_is_admin_only() {
    let app = TestApp::new();
    let user = app.register("Jane Diner", "jane@example.com", "user").await;
    let admin = app.admin().await;

    assert_eq!(
        app.get("/auth/users", Some(&user)).await.status,
        StatusCode::FORBIDDEN
    );

    let listed = app.get("/auth/users", Some(&admin)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["count"], 2);

    let created = app
        .post(
            "/auth/users",
            Some(&admin),
            json!({ "name": "Second Admin", "email": "root@example.com", "password": PASSWORD, "role": "admin" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["role"], "admin");

    let id = created.body["data"]["id"].as_str().unwrap();
    let updated = app
        .put(
            &format!("/auth/users/{}", id),
            Some(&admin),
            json!({ "role": "owner" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["role"], "owner");
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    let app = TestApp::new();

    let response = app.get("/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "healthy");
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert_eq!(response.headers["x-frame-options"], "DENY");
}
