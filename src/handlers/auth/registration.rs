use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dtos::{
        auth::{ConfirmOtpRequest, SignupRequest},
        ErrorResponse, MessageResponse,
    },
    error::AppError,
    utils::ValidatedJson,
    AppState,
};

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account registered, verification code sent", body = MessageResponse),
        (status = 400, description = "Invalid date of birth", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.accounts.signup(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Please check your email for the verification code".to_string(),
        }),
    ))
}

/// Confirm account email with a one-time code
#[utoipa::path(
    post,
    path = "/auth/confirm-otp",
    request_body = ConfirmOtpRequest,
    responses(
        (status = 200, description = "Email verified successfully", body = MessageResponse),
        (status = 400, description = "Invalid or expired OTP", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn confirm_otp(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ConfirmOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.accounts.confirm_email(&req.email, &req.otp).await?;

    Ok(Json(MessageResponse {
        message: "Email verified successfully".to_string(),
    }))
}
