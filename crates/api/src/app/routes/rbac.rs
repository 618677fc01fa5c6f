//! RBAC introspection: which roles exist and what each one grants.

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use warden_auth::{Permission, PermissionRegistry, PermissionSet, Role};

use crate::app::errors;
use crate::middleware::AuthState;

#[derive(Debug, Serialize)]
pub struct RoleDefinition<'a> {
    pub name: Role,
    pub permissions: &'a PermissionSet,
}

pub fn router(auth: &AuthState) -> Router {
    Router::new()
        .route(
            "/rbac/roles",
            get(list_roles).route_layer(auth.require(&[Permission::GetUsers])),
        )
        .route(
            "/rbac/roles/:name",
            get(get_role).route_layer(auth.require(&[Permission::GetUsers])),
        )
}

/// GET /rbac/roles - every role with its permissions, in declaration order
pub async fn list_roles() -> impl IntoResponse {
    let roles: Vec<RoleDefinition<'_>> = PermissionRegistry::global()
        .roles()
        .map(|(name, permissions)| RoleDefinition { name, permissions })
        .collect();
    Json(serde_json::json!({ "roles": roles }))
}

/// GET /rbac/roles/:name
pub async fn get_role(Path(name): Path<String>) -> axum::response::Response {
    let Ok(role) = name.parse::<Role>() else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "role not found");
    };

    let definition = RoleDefinition {
        name: role,
        permissions: PermissionRegistry::global().permissions_for(role),
    };
    (StatusCode::OK, Json(serde_json::json!({ "role": definition }))).into_response()
}
