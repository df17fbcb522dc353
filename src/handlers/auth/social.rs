use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dtos::{
        auth::{GoogleAuthRequest, GoogleAuthResponse},
        ErrorResponse,
    },
    error::AppError,
    utils::ValidatedJson,
    AppState,
};

/// Sign in with a Google identity token
#[utoipa::path(
    post,
    path = "/auth/google",
    request_body = GoogleAuthRequest,
    responses(
        (status = 200, description = "Signed in to existing account", body = GoogleAuthResponse),
        (status = 201, description = "New account created and signed in", body = GoogleAuthResponse),
        (status = 400, description = "Missing profile fields for a new account", body = ErrorResponse),
        (status = 401, description = "Invalid identity assertion", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn google_signin(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<GoogleAuthRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (tokens, is_new_user) = state.accounts.sign_in_federated(req).await?;

    let status = if is_new_user {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(GoogleAuthResponse { is_new_user, tokens })))
}
