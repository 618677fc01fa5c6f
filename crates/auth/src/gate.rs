//! Authorization gate: verification → decision → outcome.
//!
//! The gate is transport-agnostic. Adapters (e.g. the HTTP layer) implement
//! [`RequestContext`] and turn the [`AuthorizationOutcome`] into a response.

use std::sync::{Arc, OnceLock};

use thiserror::Error;

use warden_core::UserId;

use crate::{
    decide, AuthorizationRequest, CredentialVerifier, Decision, Permission, PermissionRegistry,
    Principal, Role, VerificationFailure,
};

/// Write-once holder for the principal of a single request.
///
/// Clones share the same slot, so an adapter can hand one copy to the gate
/// and another to downstream handlers.
#[derive(Debug, Clone, Default)]
pub struct PrincipalSlot(Arc<OnceLock<Principal>>);

impl PrincipalSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `principal` unless the slot is already filled.
    ///
    /// Returns the held principal. `Err` means the slot was already bound to a
    /// different identity; the slot keeps that first principal.
    pub fn attach(&self, principal: Principal) -> Result<&Principal, &Principal> {
        let offered = principal.id.clone();
        let held = self.0.get_or_init(|| principal);
        if held.id == offered { Ok(held) } else { Err(held) }
    }

    pub fn get(&self) -> Option<&Principal> {
        self.0.get()
    }
}

/// What the gate needs from an inbound request.
pub trait RequestContext {
    /// Raw credential, if the request carried one.
    fn credential(&self) -> Option<&str>;

    /// Owner of the targeted resource, if the route identifies one.
    fn resource_owner(&self) -> Option<UserId>;

    /// Slot that receives the verified principal.
    fn principal_slot(&self) -> &PrincipalSlot;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("authentication failed: {reason}")]
pub struct AuthenticationFailure {
    pub reason: VerificationFailure,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("forbidden: principal '{principal_id}' ({role}) lacks {missing:?}")]
pub struct AuthorizationFailure {
    pub principal_id: UserId,
    pub role: Role,
    pub missing: Vec<Permission>,
}

/// Terminal result of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Proceed(Principal),
    AuthenticationFailed(AuthenticationFailure),
    AuthorizationFailed(AuthorizationFailure),
}

/// Failure side of [`AuthorizationOutcome`], for `?` propagation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error(transparent)]
    Authentication(#[from] AuthenticationFailure),

    #[error(transparent)]
    Authorization(#[from] AuthorizationFailure),
}

impl AuthorizationOutcome {
    pub fn into_result(self) -> Result<Principal, GateError> {
        match self {
            Self::Proceed(principal) => Ok(principal),
            Self::AuthenticationFailed(e) => Err(e.into()),
            Self::AuthorizationFailed(e) => Err(e.into()),
        }
    }
}

/// Reusable pipeline stage configured with a route's required permissions.
#[derive(Clone)]
pub struct AuthorizationGate {
    verifier: Arc<dyn CredentialVerifier>,
    required: Arc<[Permission]>,
}

impl core::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

impl AuthorizationGate {
    /// `required` is fixed for the lifetime of the gate; empty means
    /// authentication only.
    pub fn new(verifier: Arc<dyn CredentialVerifier>, required: &[Permission]) -> Self {
        Self {
            verifier,
            required: required.into(),
        }
    }

    pub fn required(&self) -> &[Permission] {
        &self.required
    }

    /// Evaluate one request.
    ///
    /// The verifier is called exactly once. The principal is attached to the
    /// request before authorization runs, so it is visible even on denial. A
    /// request already bound to a different principal fails authentication.
    /// Dropping the returned future while verification is pending leaves the
    /// request untouched.
    pub async fn evaluate<C>(&self, ctx: &C) -> AuthorizationOutcome
    where
        C: RequestContext + Sync + ?Sized,
    {
        let verified = match self.verifier.verify(ctx.credential()).await {
            Ok(principal) => principal,
            Err(reason) => {
                tracing::info!(kind = reason.kind(), "authentication failed");
                return AuthorizationOutcome::AuthenticationFailed(AuthenticationFailure {
                    reason,
                });
            }
        };

        let verified_id = verified.id.clone();
        let principal = match ctx.principal_slot().attach(verified) {
            Ok(principal) => principal,
            Err(held) => {
                tracing::warn!(
                    held = %held.id,
                    verified = %verified_id,
                    "request already bound to another principal"
                );
                let reason = VerificationFailure::ConflictingPrincipal {
                    held: held.id.clone(),
                    verified: verified_id,
                };
                return AuthorizationOutcome::AuthenticationFailed(AuthenticationFailure {
                    reason,
                });
            }
        };

        let owner = ctx.resource_owner();
        let request = AuthorizationRequest::new(principal, &self.required)
            .with_resource_owner(owner.as_ref());

        match decide(PermissionRegistry::global(), &request) {
            Decision::Allow { basis } => {
                tracing::debug!(principal_id = %principal.id, ?basis, "authorized");
                AuthorizationOutcome::Proceed(principal.clone())
            }
            Decision::Deny { missing } => {
                tracing::warn!(
                    principal_id = %principal.id,
                    role = %principal.role,
                    ?missing,
                    owner = owner.as_ref().map(UserId::as_str),
                    "authorization denied"
                );
                AuthorizationOutcome::AuthorizationFailed(AuthorizationFailure {
                    principal_id: principal.id.clone(),
                    role: principal.role,
                    missing,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    /// Verifier that accepts `token-<id>-<role>` and counts calls.
    #[derive(Default)]
    struct StubVerifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CredentialVerifier for StubVerifier {
        async fn verify(&self, credential: Option<&str>) -> Result<Principal, VerificationFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let raw = credential.ok_or(VerificationFailure::Missing)?;
            let rest = raw
                .strip_prefix("token-")
                .ok_or_else(|| VerificationFailure::invalid("bad prefix"))?;
            let (id, role) = rest
                .split_once('-')
                .ok_or_else(|| VerificationFailure::invalid("bad shape"))?;
            let id = UserId::new(id).map_err(|e| VerificationFailure::invalid(e.to_string()))?;
            let role = role
                .parse()
                .map_err(|_| VerificationFailure::invalid("bad role"))?;
            Ok(Principal::new(id, role))
        }
    }

    /// Verifier whose result never arrives.
    struct PendingVerifier;

    #[async_trait]
    impl CredentialVerifier for PendingVerifier {
        async fn verify(
            &self,
            _credential: Option<&str>,
        ) -> Result<Principal, VerificationFailure> {
            std::future::pending().await
        }
    }

    struct TestContext {
        credential: Option<String>,
        owner: Option<String>,
        owner_reads: AtomicUsize,
        slot: PrincipalSlot,
    }

    impl TestContext {
        fn new(credential: Option<&str>, owner: Option<&str>) -> Self {
            Self {
                credential: credential.map(str::to_owned),
                owner: owner.map(str::to_owned),
                owner_reads: AtomicUsize::new(0),
                slot: PrincipalSlot::new(),
            }
        }
    }

    impl RequestContext for TestContext {
        fn credential(&self) -> Option<&str> {
            self.credential.as_deref()
        }

        fn resource_owner(&self) -> Option<UserId> {
            self.owner_reads.fetch_add(1, Ordering::SeqCst);
            self.owner.as_deref().and_then(|o| UserId::new(o).ok())
        }

        fn principal_slot(&self) -> &PrincipalSlot {
            &self.slot
        }
    }

    fn gate(verifier: &Arc<StubVerifier>, required: &[Permission]) -> AuthorizationGate {
        AuthorizationGate::new(verifier.clone(), required)
    }

    #[tokio::test]
    async fn missing_credential_fails_authentication_without_attaching() {
        let verifier = Arc::new(StubVerifier::default());
        let ctx = TestContext::new(None, Some("u1"));

        let outcome = gate(&verifier, &[Permission::GetUsers]).evaluate(&ctx).await;

        assert_eq!(
            outcome,
            AuthorizationOutcome::AuthenticationFailed(AuthenticationFailure {
                reason: VerificationFailure::Missing,
            })
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.owner_reads.load(Ordering::SeqCst), 0);
        assert!(ctx.slot.get().is_none());
    }

    #[tokio::test]
    async fn malformed_credential_fails_authentication() {
        let verifier = Arc::new(StubVerifier::default());
        let ctx = TestContext::new(Some("garbage"), Some("u1"));

        let outcome = gate(&verifier, &[]).evaluate(&ctx).await;

        assert!(matches!(outcome, AuthorizationOutcome::AuthenticationFailed(_)));
        assert_eq!(ctx.owner_reads.load(Ordering::SeqCst), 0);
        assert!(ctx.slot.get().is_none());
    }

    #[tokio::test]
    async fn denied_principal_stays_attached() {
        let verifier = Arc::new(StubVerifier::default());
        let ctx = TestContext::new(Some("token-u1-user"), None);

        let outcome = gate(&verifier, &[Permission::GetUsers]).evaluate(&ctx).await;

        let failure = match outcome {
            AuthorizationOutcome::AuthorizationFailed(failure) => failure,
            other => panic!("expected authorization failure, got {other:?}"),
        };
        assert_eq!(failure.principal_id.as_str(), "u1");
        assert_eq!(failure.missing, vec![Permission::GetUsers]);
        let attached = ctx.slot.get().expect("principal attached");
        assert_eq!(attached.id.as_str(), "u1");
        assert_eq!(attached.role, Role::User);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.owner_reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_gate_with_other_principal_fails_authentication() {
        let verifier = Arc::new(StubVerifier::default());
        let ctx = TestContext::new(Some("token-a1-admin"), Some("u2"));
        let held = Principal::new(UserId::new("u1").unwrap(), Role::User);
        ctx.slot.attach(held.clone()).unwrap();

        let outcome = gate(&verifier, &[Permission::ManageUsers]).evaluate(&ctx).await;

        assert_eq!(
            outcome,
            AuthorizationOutcome::AuthenticationFailed(AuthenticationFailure {
                reason: VerificationFailure::ConflictingPrincipal {
                    held: UserId::new("u1").unwrap(),
                    verified: UserId::new("a1").unwrap(),
                },
            })
        );
        assert_eq!(ctx.owner_reads.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.slot.get(), Some(&held));
    }

    #[tokio::test]
    async fn second_gate_with_same_principal_reuses_slot() {
        let verifier = Arc::new(StubVerifier::default());
        let ctx = TestContext::new(Some("token-u1-user"), Some("u1"));

        let first = gate(&verifier, &[]).evaluate(&ctx).await;
        let second = gate(&verifier, &[Permission::ManageUsers]).evaluate(&ctx).await;

        assert!(matches!(first, AuthorizationOutcome::Proceed(_)));
        assert!(matches!(second, AuthorizationOutcome::Proceed(ref p) if p.id.as_str() == "u1"));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn self_access_proceeds() {
        let verifier = Arc::new(StubVerifier::default());
        let ctx = TestContext::new(Some("token-u1-user"), Some("u1"));

        let outcome = gate(&verifier, &[Permission::ManageUsers]).evaluate(&ctx).await;

        let principal = outcome.into_result().unwrap();
        assert_eq!(principal.id.as_str(), "u1");
    }

    #[tokio::test]
    async fn admin_proceeds_on_any_resource() {
        let verifier = Arc::new(StubVerifier::default());
        let ctx = TestContext::new(Some("token-a1-admin"), Some("u2"));

        let outcome = gate(&verifier, &[Permission::ManageUsers, Permission::GetTokens])
            .evaluate(&ctx)
            .await;

        assert!(matches!(outcome, AuthorizationOutcome::Proceed(ref p) if p.role == Role::Admin));
    }

    #[tokio::test]
    async fn authentication_only_route_admits_any_principal() {
        let verifier = Arc::new(StubVerifier::default());
        let ctx = TestContext::new(Some("token-u9-user"), None);

        let outcome = gate(&verifier, &[]).evaluate(&ctx).await;

        assert!(matches!(outcome, AuthorizationOutcome::Proceed(_)));
    }

    #[tokio::test]
    async fn gate_errors_split_by_kind() {
        let verifier = Arc::new(StubVerifier::default());

        let unauthenticated = gate(&verifier, &[])
            .evaluate(&TestContext::new(None, None))
            .await
            .into_result();
        assert!(matches!(unauthenticated, Err(GateError::Authentication(_))));

        let forbidden = gate(&verifier, &[Permission::ManageTokens])
            .evaluate(&TestContext::new(Some("token-u1-user"), Some("u2")))
            .await
            .into_result();
        assert!(matches!(forbidden, Err(GateError::Authorization(_))));
    }

    #[tokio::test]
    async fn cancelled_evaluation_leaves_slot_empty() {
        let gate = AuthorizationGate::new(Arc::new(PendingVerifier), &[Permission::GetUsers]);
        let ctx = TestContext::new(Some("token-u1-user"), None);

        let result = tokio::time::timeout(Duration::from_millis(20), gate.evaluate(&ctx)).await;

        assert!(result.is_err());
        assert!(ctx.slot.get().is_none());
    }

    #[tokio::test]
    async fn concurrent_requests_are_independent() {
        let verifier = Arc::new(StubVerifier::default());
        let gate = gate(&verifier, &[Permission::GetUsers]);

        let mut handles = Vec::new();
        for i in 0..16 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                let token = if i % 2 == 0 {
                    format!("token-a{i}-admin")
                } else {
                    format!("token-u{i}-user")
                };
                let ctx = TestContext::new(Some(token.as_str()), None);
                let allowed = matches!(gate.evaluate(&ctx).await, AuthorizationOutcome::Proceed(_));
                (i, allowed, ctx.slot.get().map(|p| p.id.to_string()))
            }));
        }

        for handle in handles {
            let (i, allowed, attached) = handle.await.unwrap();
            assert_eq!(allowed, i % 2 == 0);
            let expected = if i % 2 == 0 { format!("a{i}") } else { format!("u{i}") };
            assert_eq!(attached, Some(expected));
        }
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn slot_is_write_once() {
        let slot = PrincipalSlot::new();
        let first = Principal::new(UserId::new("u1").unwrap(), Role::User);
        let second = Principal::new(UserId::new("a1").unwrap(), Role::Admin);

        assert_eq!(slot.attach(first.clone()), Ok(&first));
        assert_eq!(slot.attach(first.clone()), Ok(&first));
        assert_eq!(slot.attach(second), Err(&first));
        assert_eq!(slot.clone().get(), Some(&first));
    }
}
