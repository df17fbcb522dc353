mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{
    assert_status, extract_code, json_request, spawn_app, wait_for_email, TestApp,
};
use jobboard_auth::models::{OtpEntry, OtpPurpose};

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

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn forgot_password_unknown_email_not_found() {
    let app = spawn_app().await;

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/forgot-password",
            json!({ "email": "nobody@example.com" }),
        ))
        .await;
    let body = assert_status(response, StatusCode::NOT_FOUND).await;
    assert_eq!(body["error"], "User not found");

    app.teardown().await;
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn full_reset_flow_replaces_password() {
    let app = spawn_app().await;
    register_and_confirm(&app, "jane@example.com", "password123").await;

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/forgot-password",
            json!({ "email": "jane@example.com" }),
        ))
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["message"], "Reset code sent to your email");

    let notification = wait_for_email(&app.mailbox, 1).await;
    assert_eq!(notification.subject, "Reset Your Password");
    let code = extract_code(&notification);

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/reset-password",
            json!({
                "email": "jane@example.com",
                "otp": code,
                "new_password": "freshpassword1",
            }),
        ))
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["message"], "Password reset successfully");

    // Old password is dead, new one works.
    let response = app
        .request(json_request(
            Method::POST,
            "/auth/signin",
            json!({ "email": "jane@example.com", "password": "password123" }),
        ))
        .await;
    assert_status(response, StatusCode::UNAUTHORIZED).await;

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/signin",
            json!({ "email": "jane@example.com", "password": "freshpassword1" }),
        ))
        .await;
    assert_status(response, StatusCode::OK).await;

    // The reset code was consumed.
    let response = app
        .request(json_request(
            Method::POST,
            "/auth/reset-password",
            json!({
                "email": "jane@example.com",
                "otp": code,
                "new_password": "anotherpass1",
            }),
        ))
        .await;
    let body = assert_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["error"], "OTP expired");

    app.teardown().await;
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn reset_with_wrong_code_rejected() {
    let app = spawn_app().await;
    register_and_confirm(&app, "jane@example.com", "password123").await;

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/forgot-password",
            json!({ "email": "jane@example.com" }),
        ))
        .await;
    assert_status(response, StatusCode::OK).await;
    wait_for_email(&app.mailbox, 1).await;

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/reset-password",
            json!({
                "email": "jane@example.com",
                "otp": "zzzzzz",
                "new_password": "freshpassword1",
            }),
        ))
        .await;
    let body = assert_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["error"], "Invalid OTP");

    app.teardown().await;
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn expired_reset_code_rejected() {
    let app = spawn_app().await;
    register_and_confirm(&app, "jane@example.com", "password123").await;

    let user = app
        .state
        .db
        .find_user_by_email("jane@example.com")
        .await
        .expect("lookup")
        .expect("user exists");

    // Plant an already-expired entry with a known code.
    let code_hash = bcrypt::hash("AB12CD", 4).expect("hash");
    let entry = OtpEntry::new(code_hash, OtpPurpose::ResetPassword, -1);
    assert!(app
        .state
        .db
        .push_otp_entry(&user.id, &entry)
        .await
        .expect("push entry"));

    let response = app
        .request(json_request(
            Method::POST,
            "/auth/reset-password",
            json!({
                "email": "jane@example.com",
                "otp": "AB12CD",
                "new_password": "freshpassword1",
            }),
        ))
        .await;
    let body = assert_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["error"], "OTP expired");

    app.teardown().await;
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn pull_otp_entries_is_idempotent() {
    let app = spawn_app().await;
    register_and_confirm(&app, "jane@example.com", "password123").await;

    let user = app
        .state
        .db
        .find_user_by_email("jane@example.com")
        .await
        .expect("lookup")
        .expect("user exists");

    let entry = OtpEntry::new("hash".to_string(), OtpPurpose::ResetPassword, 10);
    app.state
        .db
        .push_otp_entry(&user.id, &entry)
        .await
        .expect("push entry");

    let first = app
        .state
        .db
        .pull_otp_entries(&user.id, OtpPurpose::ResetPassword)
        .await
        .expect("pull");
    assert_eq!(first, 1);

    let second = app
        .state
        .db
        .pull_otp_entries(&user.id, OtpPurpose::ResetPassword)
        .await
        .expect("pull again");
    assert_eq!(second, 0);

    app.teardown().await;
}
