mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{
    assert_status, authed_request, extract_code, json_request, spawn_app, wait_for_email, TestApp,
};

async fn register_and_confirm(app: &TestApp, email: &str, password: &str) {
    let response = app
        .request(json_request(
            Method::POST,
            "/auth/signup",
            json!({
                "first_name": "Jane",
                "last_name": "Doe",
                "email": email,
                "password": password,
                "gender": "Female",
                "date_of_birth": "1990-06-15",
                "mobile_number": "+201234567890",
            }),
        ))
        .await;
    assert_status(response, StatusCode::CREATED).await;

    let code = extract_code(&wait_for_email(&app.mailbox, 0).await);

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/confirm-otp",
            json!({ "email": email, "otp": code }),
        ))
        .await;
    assert_status(response, StatusCode::OK).await;
}

async fn sign_in(app: &TestApp, email: &str, password: &str) -> serde_json::Value {
    let response = app
        .request(json_request(
            Method::POST,
            "/auth/signin",
            json!({ "email": email, "password": password }),
        ))
        .await;
    assert_status(response, StatusCode::OK).await
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn unconfirmed_account_cannot_sign_in() {
    let app = spawn_app().await;

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/signup",
            json!({
                "first_name": "Jane",
                "last_name": "Doe",
                "email": "jane@example.com",
                "password": "password123",
                "gender": "Female",
                "date_of_birth": "1990-06-15",
            }),
        ))
        .await;
    assert_status(response, StatusCode::CREATED).await;

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/signin",
            json!({ "email": "jane@example.com", "password": "password123" }),
        ))
        .await;
    let body = assert_status(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(body["error"], "Invalid credentials");

    app.teardown().await;
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
    let app = spawn_app().await;
    register_and_confirm(&app, "jane@example.com", "password123").await;

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/signin",
            json!({ "email": "jane@example.com", "password": "wrong-password" }),
        ))
        .await;
    let wrong_password = assert_status(response, StatusCode::UNAUTHORIZED).await;

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/signin",
            json!({ "email": "nobody@example.com", "password": "password123" }),
        ))
        .await;
    let unknown_email = assert_status(response, StatusCode::UNAUTHORIZED).await;

    assert_eq!(wrong_password, unknown_email);

    app.teardown().await;
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn sign_in_grants_access_to_profile() {
    let app = spawn_app().await;
    register_and_confirm(&app, "jane@example.com", "password123").await;

    let tokens = sign_in(&app, "jane@example.com", "password123").await;
    assert_eq!(tokens["token_type"], "Bearer");
    let access = tokens["access_token"].as_str().expect("access token");

    let response = app
        .request(authed_request(
            Method::GET,
            "/users/profile",
            "Bearer",
            access,
            None,
        ))
        .await;
    let profile = assert_status(response, StatusCode::OK).await;
    assert_eq!(profile["email"], "jane@example.com");
    assert_eq!(profile["username"], "Jane Doe");
    // The mobile number comes back decrypted.
    assert_eq!(profile["mobile_number"], "+201234567890");
    assert!(profile.get("password_hash").is_none());
    assert!(profile.get("otp").is_none());

    app.teardown().await;
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn refresh_token_yields_working_access_token() {
    let app = spawn_app().await;
    register_and_confirm(&app, "jane@example.com", "password123").await;

    let tokens = sign_in(&app, "jane@example.com", "password123").await;
    let refresh = tokens["refresh_token"].as_str().expect("refresh token");

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/refresh-token",
            json!({ "refresh_token": refresh }),
        ))
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    let new_access = body["access_token"].as_str().expect("new access token");

    let response = app
        .request(authed_request(
            Method::GET,
            "/users/profile",
            "Bearer",
            new_access,
            None,
        ))
        .await;
    assert_status(response, StatusCode::OK).await;

    // Garbage never refreshes.
    let response = app
        .request(json_request(
            Method::POST,
            "/auth/refresh-token",
            json!({ "refresh_token": "not-a-token" }),
        ))
        .await;
    let body = assert_status(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(body["error"], "Invalid Authorization token");

    app.teardown().await;
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn password_change_invalidates_outstanding_tokens() {
    let app = spawn_app().await;
    register_and_confirm(&app, "jane@example.com", "password123").await;

    let tokens = sign_in(&app, "jane@example.com", "password123").await;
    let access = tokens["access_token"].as_str().expect("access token");
    let refresh = tokens["refresh_token"].as_str().expect("refresh token");

    // The credential epoch compares at second precision, strictly greater.
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = app
        .request(authed_request(
            Method::PATCH,
            "/users/password",
            "Bearer",
            access,
            Some(json!({ "old_password": "password123", "new_password": "newpassword123" })),
        ))
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["message"], "Password changed successfully");

    let response = app
        .request(authed_request(
            Method::GET,
            "/users/profile",
            "Bearer",
            access,
            None,
        ))
        .await;
    let body = assert_status(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(body["error"], "Token expired");

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/refresh-token",
            json!({ "refresh_token": refresh }),
        ))
        .await;
    let body = assert_status(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(body["error"], "Token expired");

    // The new password signs in fine.
    sign_in(&app, "jane@example.com", "newpassword123").await;

    app.teardown().await;
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn wrong_old_password_rejected() {
    let app = spawn_app().await;
    register_and_confirm(&app, "jane@example.com", "password123").await;

    let tokens = sign_in(&app, "jane@example.com", "password123").await;
    let access = tokens["access_token"].as_str().expect("access token");

    let response = app
        .request(authed_request(
            Method::PATCH,
            "/users/password",
            "Bearer",
            access,
            Some(json!({ "old_password": "not-the-password", "new_password": "newpassword123" })),
        ))
        .await;
    let body = assert_status(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(body["error"], "Invalid old password");

    app.teardown().await;
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn deleted_account_stops_authenticating() {
    let app = spawn_app().await;
    register_and_confirm(&app, "jane@example.com", "password123").await;

    let tokens = sign_in(&app, "jane@example.com", "password123").await;
    let access = tokens["access_token"].as_str().expect("access token");
    let refresh = tokens["refresh_token"].as_str().expect("refresh token");

    let response = app
        .request(authed_request(Method::DELETE, "/users", "Bearer", access, None))
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["message"], "Account deleted successfully");

    let response = app
        .request(authed_request(
            Method::GET,
            "/users/profile",
            "Bearer",
            access,
            None,
        ))
        .await;
    let body = assert_status(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(body["error"], "Invalid or inactive account");

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/refresh-token",
            json!({ "refresh_token": refresh }),
        ))
        .await;
    let body = assert_status(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(body["error"], "Invalid or inactive account");

    app.teardown().await;
}
