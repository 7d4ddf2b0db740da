use std::sync::Arc;

use axum::{extract::Extension, routing::post, Json, Router};
use chrono::Utc;

use schelper_auth::refresh::{digest, ensure_usable};
use schelper_auth::Role;
use schelper_core::{Email, Password};
use schelper_infra::{NewUser, StoreError};

use crate::app::dto::{
    LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse, TokenResponse, UserOut,
};
use crate::app::errors::ApiError;
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;

pub const PREFIX: &str = "/auth";

const EMAIL_TAKEN: &str = "Email already registered";
const BAD_LOGIN: &str = "Invalid email or password";

pub fn router() -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let email = Email::parse(&body.email)?;
    let password = Password::parse(body.password)?;
    let role: Role = body
        .role
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid role"))?;

    if services.db.user_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request(EMAIL_TAKEN));
    }

    let password_hash = services.hash_password(password).await?;
    let user = services
        .db
        .insert_user(NewUser {
            name: body.name,
            email,
            password_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::bad_request(EMAIL_TAKEN),
            other => other.into(),
        })?;

    let token = services.access_token_for(&user)?;
    tracing::info!(user_id = %user.id, role = %user.role, "user registered");

    Ok(Json(RegisterResponse {
        user: UserOut::from(user),
        token,
    }))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = Email::parse(&body.email)?;

    let Some(user) = services.db.user_by_email(&email).await? else {
        return Err(ApiError::unauthorized(BAD_LOGIN));
    };
    if !services
        .verify_password(body.password, user.password_hash.clone())
        .await
    {
        return Err(ApiError::unauthorized(BAD_LOGIN));
    }

    let token = services.access_token_for(&user)?;
    let refresh_token = services.issue_refresh_token(&user).await?;

    Ok(Json(TokenResponse {
        token,
        refresh_token: Some(refresh_token),
    }))
}

/// Exchange a refresh token for a new access token. The refresh token is not rotated.
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let stored = services
        .db
        .refresh_token_by_hash(&digest(body.refresh_token.trim()))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    ensure_usable(stored.expires_at, stored.revoked, Utc::now())
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let user = services
        .db
        .user_by_id(stored.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unknown user"))?;

    Ok(Json(TokenResponse {
        token: services.access_token_for(&user)?,
        refresh_token: None,
    }))
}
