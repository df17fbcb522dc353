pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::services::{AccountService, MongoDb, TokenService};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::registration::signup,
        handlers::auth::registration::confirm_otp,
        handlers::auth::session::signin,
        handlers::auth::session::refresh_token,
        handlers::auth::password::forgot_password,
        handlers::auth::password::reset_password,
        handlers::auth::social::google_signin,
        handlers::user::get_profile,
        handlers::user::change_password,
        handlers::user::delete_account,
        handlers::admin::ban_user,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::SignupRequest,
            dtos::auth::ConfirmOtpRequest,
            dtos::auth::SigninRequest,
            dtos::auth::GoogleAuthRequest,
            dtos::auth::GoogleAuthResponse,
            dtos::auth::ForgotPasswordRequest,
            dtos::auth::ResetPasswordRequest,
            dtos::auth::RefreshTokenRequest,
            dtos::auth::RefreshTokenResponse,
            handlers::user::ChangePasswordRequest,
            handlers::admin::BanResponse,
            services::TokenPair,
            models::SanitizedUser,
            models::Role,
            models::Provider,
            models::Gender,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, sign-in and token management"),
        (name = "User", description = "Authenticated account operations"),
        (name = "Admin", description = "Administrative operations"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            // Admin tokens travel in the same header under the `Admin` scheme.
            components.add_security_scheme(
                "admin_auth",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "Admin-domain token, sent as `Admin <token>`",
                ))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub db: MongoDb,
    pub tokens: TokenService,
    pub accounts: AccountService,
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let user_routes = Router::new()
        .route("/users/profile", get(handlers::user::get_profile))
        .route("/users/password", patch(handlers::user::change_password))
        .route("/users", delete(handlers::user::delete_account))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    // The authorization gate runs first, then the role check.
    let admin_routes = Router::new()
        .route("/admin/users/:user_id/ban", patch(handlers::admin::ban_user))
        .layer(from_fn(middleware::admin_only))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new().route("/health", get(health_check));

    if state.config.swagger.enabled.is_enabled() {
        app = app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    let app = app
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/confirm-otp", post(handlers::auth::confirm_otp))
        .route("/auth/signin", post(handlers::auth::signin))
        .route("/auth/google", post(handlers::auth::google_signin))
        .route("/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        .route("/auth/refresh-token", post(handlers::auth::refresh_token))
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(state.clone())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(cors_layer(&state.config)?);

    Ok(app)
}

fn cors_layer(config: &AuthConfig) -> Result<CorsLayer, AppError> {
    let origins = config
        .security
        .allowed_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{origin}': {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "MongoDB health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "mongodb": "up"
        }
    })))
}
