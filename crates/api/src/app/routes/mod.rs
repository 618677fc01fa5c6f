use axum::Router;

use crate::middleware::AuthState;

pub mod rbac;
pub mod system;
pub mod users;

/// All gated routes. `owner_param` names the path parameter carrying the
/// owner of user-scoped resources.
pub fn router(auth: &AuthState, owner_param: &str) -> Router {
    Router::new()
        .merge(system::router(auth))
        .merge(users::router(auth, owner_param))
        .merge(rbac::router(auth))
}
