//! Credential verification contract.
//!
//! Implemented by an authentication provider; the gate only consumes it.

use async_trait::async_trait;
use thiserror::Error;

use warden_core::UserId;

use crate::Principal;

/// Why a credential did not produce a principal.
///
/// The gate reports every variant as an authentication failure. The
/// distinction exists for logs and for verifiers that want to surface a
/// transient provider problem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    #[error("no credential presented")]
    Missing,

    #[error("credential rejected: {0}")]
    Invalid(String),

    #[error("credential has expired")]
    Expired,

    #[error("credential subject is not a known principal")]
    UnknownPrincipal,

    #[error("verification provider unavailable: {0}")]
    Unavailable(String),

    /// The request already carries a different verified principal.
    #[error("request already bound to '{held}', credential is for '{verified}'")]
    ConflictingPrincipal { held: UserId, verified: UserId },
}

impl VerificationFailure {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Short machine-readable label, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Invalid(_) => "invalid",
            Self::Expired => "expired",
            Self::UnknownPrincipal => "unknown_principal",
            Self::Unavailable(_) => "unavailable",
            Self::ConflictingPrincipal { .. } => "conflicting_principal",
        }
    }
}

/// Turns a raw credential into a verified principal.
///
/// `credential` is `None` when the request carried none. Implementations
/// produce exactly one result per call and may suspend (network lookups,
/// signature checks) without blocking other requests.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credential: Option<&str>) -> Result<Principal, VerificationFailure>;
}
