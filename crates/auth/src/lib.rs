//! `warden-auth` — authentication/authorization gate (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage: transports
//! implement [`RequestContext`], credential providers implement
//! [`CredentialVerifier`].

pub mod authorize;
pub mod claims;
pub mod gate;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod registry;
pub mod roles;
pub mod verifier;

pub use authorize::{decide, AllowBasis, AuthorizationRequest, Decision};
pub use claims::{validate_claims, JwtClaims, TokenType, TokenValidationError};
pub use gate::{
    AuthenticationFailure, AuthorizationFailure, AuthorizationGate, AuthorizationOutcome,
    GateError, PrincipalSlot, RequestContext,
};
pub use jwt::{DirectoryError, InMemoryUserDirectory, JwtVerifier, UserDirectory};
pub use permissions::{Permission, PermissionSet};
pub use principal::Principal;
pub use registry::{PermissionRegistry, RegistryError, DEFAULT_GRANTS};
pub use roles::Role;
pub use verifier::{CredentialVerifier, VerificationFailure};
