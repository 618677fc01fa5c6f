//! Route-level gate layer.
//!
//! ```ignore
//! Router::new().route(
//!     "/users/:userId",
//!     get(get_user).route_layer(auth.require(&[Permission::GetUsers]).owner_param("userId")),
//! )
//! ```

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    extract::{FromRequestParts, RawPathParams, Request},
    http::request::Parts,
    response::Response,
};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

use warden_auth::{AuthorizationGate, CredentialVerifier, Permission, RequestContext};

use crate::app::errors;
use crate::context::HttpRequestContext;

/// Shared authentication wiring; hands out one [`GateLayer`] per route.
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl AuthState {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { verifier }
    }

    /// Gate requiring every permission in `required`; `&[]` enforces
    /// authentication only.
    pub fn require(&self, required: &[Permission]) -> GateLayer {
        GateLayer {
            gate: AuthorizationGate::new(self.verifier.clone(), required),
            owner_param: None,
        }
    }
}

/// Tower layer running an [`AuthorizationGate`] in front of a route.
#[derive(Debug, Clone)]
pub struct GateLayer {
    gate: AuthorizationGate,
    owner_param: Option<Arc<str>>,
}

impl GateLayer {
    /// Name of the path parameter that identifies the owner of the targeted
    /// resource, enabling self-access on this route.
    pub fn owner_param(mut self, name: impl Into<Arc<str>>) -> Self {
        self.owner_param = Some(name.into());
        self
    }
}

impl<S> Layer<S> for GateLayer {
    type Service = GateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GateService {
            inner,
            gate: self.gate.clone(),
            owner_param: self.owner_param.clone(),
        }
    }
}

/// Service wrapper for [`GateLayer`].
#[derive(Debug, Clone)]
pub struct GateService<S> {
    inner: S,
    gate: AuthorizationGate,
    owner_param: Option<Arc<str>>,
}

impl<S> Service<Request> for GateService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // Keep the instance that was polled ready.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let gate = self.gate.clone();
        let owner_param = self.owner_param.clone();

        let span = tracing::info_span!(
            "gate",
            request_id = %Uuid::now_v7(),
            method = %req.method(),
            path = %req.uri().path(),
        );

        Box::pin(
            async move {
                let (mut parts, body) = req.into_parts();

                let owner = match owner_param.as_deref() {
                    Some(name) => path_param(&mut parts, name).await,
                    None => None,
                };
                let ctx = HttpRequestContext::new(&parts, owner);

                let outcome = gate.evaluate(&ctx).await;
                parts.extensions.insert(ctx.principal_slot().clone());

                match outcome.into_result() {
                    Ok(_) => inner.call(Request::from_parts(parts, body)).await,
                    Err(err) => {
                        let mut response = errors::gate_error_to_response(&err);
                        if let Some(principal) = ctx.principal_slot().get() {
                            response.extensions_mut().insert(principal.clone());
                        }
                        Ok(response)
                    }
                }
            }
            .instrument(span),
        )
    }
}

async fn path_param(parts: &mut Parts, name: &str) -> Option<String> {
    let params = RawPathParams::from_request_parts(parts, &()).await.ok()?;
    params
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
}
