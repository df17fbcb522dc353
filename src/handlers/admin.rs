use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{dtos::ErrorResponse, error::AppError, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct BanResponse {
    #[schema(example = "User banned")]
    pub message: String,
    pub banned: bool,
}

/// Toggle the soft ban on an account
#[utoipa::path(
    patch,
    path = "/admin/users/{user_id}/ban",
    params(
        ("user_id" = String, Path, description = "Account identifier")
    ),
    responses(
        (status = 200, description = "Ban toggled", body = BanResponse),
        (status = 401, description = "Missing, invalid or stale token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("admin_auth" = [])),
    tag = "Admin"
)]
pub async fn ban_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let banned = state.accounts.toggle_ban(&user_id).await?;

    let message = if banned { "User banned" } else { "User unbanned" };
    Ok(Json(BanResponse {
        message: message.to_string(),
        banned,
    }))
}
