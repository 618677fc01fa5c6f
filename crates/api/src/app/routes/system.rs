use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use warden_auth::PermissionRegistry;

use crate::context::CurrentPrincipal;
use crate::middleware::AuthState;

pub fn router(auth: &AuthState) -> Router {
    Router::new().route("/whoami", get(whoami).route_layer(auth.require(&[])))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(CurrentPrincipal(principal): CurrentPrincipal) -> impl IntoResponse {
    let permissions = PermissionRegistry::global().permissions_for(principal.role);
    Json(serde_json::json!({
        "id": principal.id,
        "role": principal.role,
        "permissions": permissions,
    }))
}
