use axum::{extract::Request, middleware::Next, response::Response};

use crate::{
    error::AppError,
    models::{Role, User},
};

/// Second-stage check behind the authorization gate: the authenticated
/// account's role must be in the allowed set.
pub async fn require_role(
    allowed: &'static [Role],
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req.extensions().get::<User>().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Authenticated user missing from request extensions"
        ))
    })?;

    if !allowed.contains(&user.role) {
        return Err(AppError::Forbidden(anyhow::anyhow!("Access Denied")));
    }

    Ok(next.run(req).await)
}

pub async fn admin_only(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(&[Role::Admin], req, next).await
}
