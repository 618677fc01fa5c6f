//! Bearer-token verifier backed by HS256 JWTs and a user directory.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use warden_core::UserId;

use crate::{
    validate_claims, CredentialVerifier, JwtClaims, Principal, Role, TokenValidationError,
    VerificationFailure,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("user directory unavailable: {0}")]
pub struct DirectoryError(pub String);

/// Resolves a token subject to the principal it currently represents.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find(&self, id: &UserId) -> Result<Option<Principal>, DirectoryError>;
}

/// Directory held in process memory (development and tests).
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<BTreeMap<UserId, Role>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: UserId, role: Role) -> Option<Role> {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, role)
    }

    pub fn remove(&self, id: &UserId) -> Option<Role> {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    pub fn get(&self, id: &UserId) -> Option<Principal> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|role| Principal::new(id.clone(), *role))
    }

    /// Every known principal, ordered by id.
    pub fn list(&self) -> Vec<Principal> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, role)| Principal::new(id.clone(), *role))
            .collect()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find(&self, id: &UserId) -> Result<Option<Principal>, DirectoryError> {
        Ok(self.get(id))
    }
}

/// [`CredentialVerifier`] for `HS256` access tokens.
///
/// Steps: signature, claims ([`validate_claims`]), then subject lookup. The
/// role always comes from the directory, never from the token.
pub struct JwtVerifier<D: ?Sized> {
    key: DecodingKey,
    validation: Validation,
    directory: Arc<D>,
}

impl<D: UserDirectory + ?Sized> JwtVerifier<D> {
    pub fn hs256(secret: &[u8], directory: Arc<D>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks run in `validate_claims` against an explicit clock.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
            directory,
        }
    }

    /// Decode and validate `token` as of `now`.
    pub fn decode_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<JwtClaims, VerificationFailure> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| VerificationFailure::invalid(e.to_string()))?;

        validate_claims(&data.claims, now).map_err(|e| match e {
            TokenValidationError::Expired => VerificationFailure::Expired,
            other => VerificationFailure::invalid(other.to_string()),
        })?;

        Ok(data.claims)
    }
}

#[async_trait]
impl<D: UserDirectory + ?Sized> CredentialVerifier for JwtVerifier<D> {
    async fn verify(&self, credential: Option<&str>) -> Result<Principal, VerificationFailure> {
        let token = credential.ok_or(VerificationFailure::Missing)?;
        let claims = self.decode_at(token, Utc::now())?;

        match self.directory.find(&claims.sub).await {
            Ok(Some(principal)) => Ok(principal),
            Ok(None) => Err(VerificationFailure::UnknownPrincipal),
            Err(e) => Err(VerificationFailure::unavailable(e.to_string())),
        }
    }
}
