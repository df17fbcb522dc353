use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    models::{Role, User},
    services::TrustDomain,
    AppState,
};

/// Authorization gate. Maps the header scheme to a trust domain, verifies
/// the token, re-fetches the account and enforces its live state before any
/// handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let (domain, token) = parse_authorization(header_value)?;

    let claims = state.tokens.verify(token, domain).map_err(AppError::from)?;

    let user = state
        .db
        .find_user_by_id(&claims.sub)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("User not found")))?;

    if !user.is_active() {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Invalid or inactive account"
        )));
    }

    if user.credentials_changed_since(claims.iat) {
        return Err(AppError::Unauthorized(anyhow::anyhow!("Token expired")));
    }

    // Company-scoped roles are unusable without a company affiliation.
    if matches!(user.role, Role::CompanyHr | Role::CompanyOwner) && user.company_id.is_none() {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "User is not associated with any company"
        )));
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Split the Authorization header into a trust domain and raw token.
/// `Bearer` selects the user domain, `Admin` the admin domain.
pub fn parse_authorization(header: Option<&str>) -> Result<(TrustDomain, &str), AppError> {
    let header = header.ok_or_else(|| {
        AppError::Unauthorized(anyhow::anyhow!("Authorization header is required"))
    })?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Malformed Authorization header")))?;

    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Malformed Authorization header"
        )));
    }

    match scheme {
        "Bearer" => Ok((TrustDomain::User, token)),
        "Admin" => Ok((TrustDomain::Admin, token)),
        _ => Err(AppError::Unauthorized(anyhow::anyhow!(
            "Invalid authorization scheme"
        ))),
    }
}

/// Extractor for the authenticated account placed in request extensions by
/// the gate.
pub struct AuthUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Authenticated user missing from request extensions"
            ))
        })?;

        Ok(AuthUser(user.clone()))
    }
}
