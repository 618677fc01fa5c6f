//! User endpoints: admins manage everyone, users reach their own record via
//! self-access.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};

use warden_auth::{InMemoryUserDirectory, Permission};
use warden_core::UserId;

use crate::app::errors;
use crate::context::CurrentPrincipal;
use crate::middleware::AuthState;

pub fn router(auth: &AuthState, owner_param: &str) -> Router {
    let item = format!("/users/:{owner_param}");

    Router::new()
        .route(
            "/users",
            get(list_users).route_layer(auth.require(&[Permission::GetUsers])),
        )
        .route(
            &item,
            get(get_user)
                .route_layer(auth.require(&[Permission::GetUsers]).owner_param(owner_param))
                .merge(
                    delete(delete_user).route_layer(
                        auth.require(&[Permission::ManageUsers]).owner_param(owner_param),
                    ),
                ),
        )
}

/// GET /users
pub async fn list_users(
    Extension(directory): Extension<Arc<InMemoryUserDirectory>>,
) -> impl IntoResponse {
    Json(serde_json::json!({ "users": directory.list() }))
}

/// GET /users/:userId
pub async fn get_user(
    Extension(directory): Extension<Arc<InMemoryUserDirectory>>,
    Path(user_id): Path<String>,
) -> axum::response::Response {
    let id = match parse_user_id(user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match directory.get(&id) {
        Some(user) => (StatusCode::OK, Json(user)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "User not found"),
    }
}

/// DELETE /users/:userId
pub async fn delete_user(
    Extension(directory): Extension<Arc<InMemoryUserDirectory>>,
    CurrentPrincipal(actor): CurrentPrincipal,
    Path(user_id): Path<String>,
) -> axum::response::Response {
    let id = match parse_user_id(user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match directory.remove(&id) {
        Some(_) => {
            tracing::info!(actor = %actor.id, user_id = %id, "user deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "User not found"),
    }
}

fn parse_user_id(raw: String) -> Result<UserId, axum::response::Response> {
    UserId::new(raw)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_user_id", e.to_string()))
}
