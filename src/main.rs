use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;

use jobboard_auth::{
    build_router,
    config::AuthConfig,
    error::AppError,
    observability::init_tracing,
    services::{
        AccountService, GoogleIdentityProvider, MongoDb, Notifier, OtpManager, OtpSweeper,
        SmtpEmailService, TokenService,
    },
    utils::crypto::FieldCipher,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting authentication service"
    );

    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
    db.initialize_indexes().await?;
    tracing::info!("Database initialized");

    let email = Arc::new(SmtpEmailService::new(&config.smtp)?);
    let notifier = Notifier::start(email);
    tracing::info!("Email dispatcher started");

    let tokens = TokenService::new(&config.tokens)?;
    let cipher = FieldCipher::new(&config.crypto.encryption_key)?;
    let otp = OtpManager::new(config.otp.ttl_minutes, config.crypto.bcrypt_cost);
    let identity = Arc::new(GoogleIdentityProvider::new(&config.google));

    let accounts = AccountService::new(
        db.clone(),
        tokens.clone(),
        otp,
        notifier,
        cipher,
        identity,
        config.crypto.bcrypt_cost,
    );

    // Background sweep of expired one-time codes.
    let sweeper = OtpSweeper::new(db.clone(), config.sweeper.interval_hours);
    tokio::spawn(sweeper.run());

    let state = AppState {
        config: config.clone(),
        db,
        tokens,
        accounts,
    };
    let app = build_router(state)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
