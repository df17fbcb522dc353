use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    dtos::{
        auth::{RefreshTokenRequest, RefreshTokenResponse, SigninRequest},
        ErrorResponse,
    },
    error::AppError,
    services::TokenPair,
    utils::ValidatedJson,
    AppState,
};

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in successfully", body = TokenPair),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn signin(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SigninRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.accounts.sign_in(&req.email, &req.password).await?;
    Ok(Json(pair))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/auth/refresh-token",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token issued", body = RefreshTokenResponse),
        (status = 401, description = "Invalid, expired or inactive token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let access_token = state.accounts.refresh_token(&req.refresh_token).await?;
    Ok(Json(RefreshTokenResponse { access_token }))
}
