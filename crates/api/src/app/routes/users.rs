use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Json, Router,
};

use schelper_auth::{authorize_link, check_link_roles, Role};
use schelper_core::{Email, Entity, Password, UserId};
use schelper_infra::{LinkRecord, NewLink, StoreError, UserChanges};

use crate::app::dto::{LinkRequest, StatusResponse, UpdateUserRequest, UserOut};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, ApiPath};
use crate::app::services::AppServices;
use crate::context::CurrentUser;
use crate::middleware;

pub const PREFIX: &str = "/users";

const USER_NOT_FOUND: &str = "User not found";

/// Routes open to any authenticated user, plus the admin-only CRUD routes.
///
/// The caller wraps the whole group in `auth_middleware`.
pub fn router() -> Router {
    let admin = Router::new()
        .route("/users", get(list_users))
        .route("/users/", get(list_users))
        .route(
            "/users/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(axum::middleware::from_fn(middleware::require_admin));

    Router::new()
        .route("/users/me", get(me))
        .route("/users/link", post(link_parent_child))
        .merge(admin)
}

pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<UserOut> {
    Json(UserOut::from(current.into_record()))
}

pub async fn link_parent_child(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(body): ApiJson<LinkRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    authorize_link(&current.principal(), body.parent_id)?;

    let parent = services.db.user_by_id(body.parent_id).await?;
    let child = services.db.user_by_id(body.child_id).await?;
    let (Some(parent), Some(child)) = (parent, child) else {
        return Err(ApiError::not_found("Parent or child not found"));
    };
    check_link_roles(parent.role, child.role)?;

    let link = services
        .db
        .link_parent_child(NewLink {
            parent_id: parent.id,
            child_id: child.id,
            relation_type: body.relation_type,
        })
        .await
        .map_err(|e| match e {
            StoreError::MissingReference(_) => ApiError::not_found("Parent or child not found"),
            other => other.into(),
        })?;
    tracing::info!(
        kind = LinkRecord::KIND,
        id = %link.id(),
        parent_id = %link.parent_id,
        child_id = %link.child_id,
        "parent linked to child"
    );

    Ok(Json(StatusResponse::LINKED))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<UserOut>>, ApiError> {
    let users = services.db.list_users().await?;
    Ok(Json(users.into_iter().map(UserOut::from).collect()))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<UserOut>, ApiError> {
    let user = services
        .db
        .user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;
    Ok(Json(user.into()))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserOut>, ApiError> {
    let email = body.email.as_deref().map(Email::parse).transpose()?;
    let password = body.password.map(Password::parse).transpose()?;

    let Some(existing) = services.db.user_by_id(id).await? else {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    };

    let role = body
        .role
        .map(|raw| raw.parse::<Role>())
        .transpose()
        .map_err(|_| ApiError::bad_request("Invalid role"))?;
    let password_hash = match password {
        Some(password) => Some(services.hash_password(password).await?),
        None => None,
    };

    let changes = UserChanges {
        name: body.name,
        email,
        role,
        password_hash,
    };
    if changes.is_empty() {
        return Ok(Json(existing.into()));
    }

    let updated = services
        .db
        .update_user(id, changes)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::bad_request("Email already registered"),
            other => other.into(),
        })?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    Ok(Json(updated.into()))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<StatusResponse>, ApiError> {
    if !services.db.delete_user(id).await? {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }
    tracing::info!(user_id = %id, "user deleted");
    Ok(Json(StatusResponse::DELETED))
}
