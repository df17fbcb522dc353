mod common;

use chrono::{NaiveDate, Utc};

use common::spawn_app;
use jobboard_auth::models::{Gender, OtpEntry, OtpPurpose, User};

fn seed_user(email: &str, otp: Vec<OtpEntry>) -> User {
    User::new_local(
        "Seed".to_string(),
        "User".to_string(),
        email.to_string(),
        "$2b$04$hash".to_string(),
        Gender::Female,
        NaiveDate::from_ymd_opt(1980, 1, 1).expect("valid date"),
        None,
        otp,
    )
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn purge_removes_only_expired_entries() {
    let app = spawn_app().await;

    let expired = OtpEntry::new("hash-a".to_string(), OtpPurpose::ConfirmEmail, -5);
    let live = OtpEntry::new("hash-b".to_string(), OtpPurpose::ResetPassword, 10);
    let user = seed_user("mixed@example.com", vec![expired, live]);
    app.state.db.insert_user(&user).await.expect("insert");

    let untouched = seed_user(
        "live-only@example.com",
        vec![OtpEntry::new(
            "hash-c".to_string(),
            OtpPurpose::ConfirmEmail,
            10,
        )],
    );
    app.state.db.insert_user(&untouched).await.expect("insert");

    let purged = app
        .state
        .db
        .purge_expired_otps(Utc::now())
        .await
        .expect("purge");
    assert_eq!(purged, 1);

    let user = app
        .state
        .db
        .find_user_by_id(&user.id)
        .await
        .expect("lookup")
        .expect("user exists");
    assert_eq!(user.otp.len(), 1);
    assert_eq!(user.otp[0].purpose, OtpPurpose::ResetPassword);

    let untouched = app
        .state
        .db
        .find_user_by_id(&untouched.id)
        .await
        .expect("lookup")
        .expect("user exists");
    assert_eq!(untouched.otp.len(), 1);

    app.teardown().await;
}

// Requires running MongoDB
#[tokio::test]
#[ignore]
async fn purge_with_nothing_expired_is_a_noop() {
    let app = spawn_app().await;

    let user = seed_user(
        "live@example.com",
        vec![OtpEntry::new(
            "hash".to_string(),
            OtpPurpose::ConfirmEmail,
            10,
        )],
    );
    app.state.db.insert_user(&user).await.expect("insert");

    let purged = app
        .state
        .db
        .purge_expired_otps(Utc::now())
        .await
        .expect("purge");
    assert_eq!(purged, 0);

    app.teardown().await;
}
