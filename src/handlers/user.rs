use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dtos::{ErrorResponse, MessageResponse},
    error::AppError,
    middleware::AuthUser,
    models::SanitizedUser,
    utils::ValidatedJson,
    AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Old password is required"))]
    #[schema(example = "password123")]
    pub old_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "newpassword123", min_length = 8)]
    pub new_password: String,
}

/// Get the authenticated account's profile
#[utoipa::path(
    get,
    path = "/users/profile",
    responses(
        (status = 200, description = "Profile of the authenticated account", body = SanitizedUser),
        (status = 401, description = "Missing, invalid or stale token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.accounts.profile(&user)?;
    Ok(Json(profile))
}

/// Change the authenticated account's password
#[utoipa::path(
    patch,
    path = "/users/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully", body = MessageResponse),
        (status = 401, description = "Invalid old password", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .accounts
        .change_password(&user, &req.old_password, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// Soft-delete the authenticated account
#[utoipa::path(
    delete,
    path = "/users",
    responses(
        (status = 200, description = "Account deleted successfully", body = MessageResponse),
        (status = 401, description = "Missing, invalid or stale token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.accounts.delete_account(&user.id).await?;

    Ok(Json(MessageResponse {
        message: "Account deleted successfully".to_string(),
    }))
}
