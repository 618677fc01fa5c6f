//! HTTP API application wiring (Axum router + gate wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per area), each route
//!   carrying its own gate layer
//! - `errors.rs`: consistent error responses, including the 401/403 mapping

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use warden_auth::{InMemoryUserDirectory, JwtVerifier};

use crate::config::ApiConfig;
use crate::middleware::AuthState;

pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &ApiConfig, directory: Arc<InMemoryUserDirectory>) -> Router {
    let verifier = Arc::new(JwtVerifier::hs256(
        config.jwt_secret.as_bytes(),
        directory.clone(),
    ));
    let auth = AuthState::new(verifier);

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router(&auth, &config.owner_param))
        .layer(Extension(directory))
}
