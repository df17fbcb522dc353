#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tokio::sync::Mutex;
use tower::ServiceExt;

use jobboard_auth::{
    build_router,
    config::{
        AuthConfig, CryptoConfig, Environment, GoogleConfig, MongoConfig, OtpConfig,
        SecurityConfig, SmtpConfig, SwaggerConfig, SwaggerMode, SweeperConfig, TokenConfig,
    },
    services::{
        AccountService, EmailNotification, MockEmailService, MockIdentityProvider, MongoDb,
        Notifier, OtpManager, TokenService, VerifiedIdentity,
    },
    utils::crypto::FieldCipher,
    AppState,
};

// Low bcrypt cost keeps the suite fast.
const TEST_BCRYPT_COST: u32 = 4;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailbox: Arc<Mutex<Vec<EmailNotification>>>,
}

impl TestApp {
    /// Issue a request against the in-process router.
    pub async fn request(&self, req: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("router should always produce a response")
    }

    /// Drop the throwaway database. Call at the end of every test.
    pub async fn teardown(&self) {
        self.state
            .db
            .database()
            .drop(None)
            .await
            .expect("failed to drop test database");
    }
}

fn test_config(db_name: &str) -> AuthConfig {
    let uri = std::env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    AuthConfig {
        environment: Environment::Dev,
        service_name: "jobboard-auth-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "warn".to_string(),
        port: 8080,
        mongodb: MongoConfig {
            uri,
            database: db_name.to_string(),
        },
        tokens: TokenConfig {
            user_secret: "user-test-secret".to_string(),
            admin_secret: "admin-test-secret".to_string(),
            access_token_expiry_minutes: 60,
            refresh_token_expiry_days: 7,
        },
        crypto: CryptoConfig {
            encryption_key: "test-encryption-key-32-chars-ok!".to_string(),
            bcrypt_cost: TEST_BCRYPT_COST,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_address: "no-reply@jobboard.local".to_string(),
        },
        google: GoogleConfig {
            client_id: "test-client-id".to_string(),
        },
        otp: OtpConfig { ttl_minutes: 10 },
        sweeper: SweeperConfig { interval_hours: 6 },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_identity(VerifiedIdentity {
        email: "federated@example.com".to_string(),
        given_name: Some("Fed".to_string()),
        family_name: Some("User".to_string()),
    })
    .await
}

/// Build an app against a uuid-suffixed throwaway database, with email and
/// federated identity both mocked.
pub async fn spawn_app_with_identity(identity: VerifiedIdentity) -> TestApp {
    let db_name = format!("test_auth_{}", uuid::Uuid::new_v4().simple());
    let config = test_config(&db_name);

    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
        .await
        .expect("failed to connect to MongoDB");
    db.initialize_indexes()
        .await
        .expect("failed to create indexes");

    let email = MockEmailService::new();
    let mailbox = email.sent.clone();
    let notifier = Notifier::start(Arc::new(email));

    let tokens = TokenService::new(&config.tokens).expect("token service");
    let cipher = FieldCipher::new(&config.crypto.encryption_key).expect("cipher");
    let otp = OtpManager::new(config.otp.ttl_minutes, config.crypto.bcrypt_cost);

    let accounts = AccountService::new(
        db.clone(),
        tokens.clone(),
        otp,
        notifier,
        cipher,
        Arc::new(MockIdentityProvider { identity }),
        config.crypto.bcrypt_cost,
    );

    let state = AppState {
        config,
        db,
        tokens,
        accounts,
    };
    let router = build_router(state.clone()).expect("router");

    TestApp {
        router,
        state,
        mailbox,
    }
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn authed_request(
    method: Method,
    uri: &str,
    scheme: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("{scheme} {token}"));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request")
}

pub async fn response_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

pub async fn assert_status(response: Response<Body>, expected: StatusCode) -> serde_json::Value {
    let status = response.status();
    let body = response_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {body}");
    body
}

/// Emails are dispatched off the request path; poll until one lands.
pub async fn wait_for_email(
    mailbox: &Arc<Mutex<Vec<EmailNotification>>>,
    index: usize,
) -> EmailNotification {
    for _ in 0..100 {
        {
            let sent = mailbox.lock().await;
            if let Some(notification) = sent.get(index) {
                return notification.clone();
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("email {index} was never delivered");
}

/// Pull the 6-character one-time code out of a notification body.
pub fn extract_code(notification: &EmailNotification) -> String {
    let marker = "code is: ";
    let start = notification
        .text_body
        .find(marker)
        .expect("notification should carry a code")
        + marker.len();
    notification.text_body[start..start + 6].to_string()
}
