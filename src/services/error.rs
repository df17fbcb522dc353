use thiserror::Error;

use crate::error::AppError;

/// Domain-level failures. The transport mapping (status code and client
/// message) lives in the `From<ServiceError> for AppError` impl.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Email already exists")]
    EmailExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid old password")]
    InvalidOldPassword,

    #[error("User not found")]
    UserNotFound,

    #[error("OTP expired")]
    OtpExpired,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid Authorization token")]
    InvalidToken,

    #[error("Invalid or inactive account")]
    AccountInactive,

    #[error("Invalid identity assertion")]
    InvalidAssertion,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] mongodb::error::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::EmailExists => AppError::Conflict(anyhow::anyhow!("Email already exists")),
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::InvalidOldPassword => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid old password"))
            }
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::OtpExpired => AppError::BadRequest(anyhow::anyhow!("OTP expired")),
            ServiceError::InvalidOtp => AppError::BadRequest(anyhow::anyhow!("Invalid OTP")),
            ServiceError::TokenExpired => AppError::Unauthorized(anyhow::anyhow!("Token expired")),
            ServiceError::InvalidToken => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid Authorization token"))
            }
            ServiceError::AccountInactive => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid or inactive account"))
            }
            ServiceError::InvalidAssertion => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid identity assertion"))
            }
            ServiceError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
