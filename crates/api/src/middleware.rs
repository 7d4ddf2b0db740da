use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use schelper_auth::{require_role, JwtValidator, Role};
use schelper_infra::Database;

use crate::app::errors::ApiError;
use crate::context::CurrentUser;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub db: Arc<dyn Database>,
}

/// Resolve the bearer token to a stored user and attach it as `CurrentUser`.
///
/// Every failure (missing header, bad token, deleted user) is the same 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers()).ok_or(ApiError::InvalidCredentials)?;

    let claims = state.jwt.validate(token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "rejected access token");
        ApiError::InvalidCredentials
    })?;
    let principal = claims.principal().map_err(|_| ApiError::InvalidCredentials)?;

    let user = state
        .db
        .user_by_id(principal.user_id)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    req.extensions_mut().insert(CurrentUser::new(user));
    Ok(next.run(req).await)
}

/// Gate for admin-only routes; must run inside `auth_middleware`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(ApiError::InvalidCredentials)?;
    require_role(&user.principal(), &[Role::Admin])?;
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
