use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::Response,
};

use warden_auth::{Principal, PrincipalSlot, RequestContext};
use warden_core::UserId;

use crate::app::errors;

/// Per-request view handed to the gate.
///
/// The principal slot is shared with the request's extensions, so a second
/// gate on the same request sees (and keeps) the first principal.
#[derive(Debug, Clone)]
pub struct HttpRequestContext {
    credential: Option<String>,
    resource_owner: Option<String>,
    slot: PrincipalSlot,
}

impl HttpRequestContext {
    pub fn new(parts: &Parts, resource_owner: Option<String>) -> Self {
        Self {
            credential: bearer_token(&parts.headers).map(str::to_owned),
            resource_owner,
            slot: parts
                .extensions
                .get::<PrincipalSlot>()
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl RequestContext for HttpRequestContext {
    fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    fn resource_owner(&self) -> Option<UserId> {
        self.resource_owner
            .as_deref()
            .and_then(|raw| UserId::new(raw).ok())
    }

    fn principal_slot(&self) -> &PrincipalSlot {
        &self.slot
    }
}

/// Token from `Authorization: Bearer <token>`; `None` for anything else.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

/// Extractor for the principal attached by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentPrincipal(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PrincipalSlot>()
            .and_then(PrincipalSlot::get)
            .cloned()
            .map(CurrentPrincipal)
            .ok_or_else(|| {
                errors::json_error(
                    StatusCode::UNAUTHORIZED,
                    "unauthenticated",
                    "Please authenticate",
                )
            })
    }
}
