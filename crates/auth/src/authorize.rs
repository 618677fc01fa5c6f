//! Authorization decision.
//!
//! - No IO
//! - No panics
//! - Pure over the registry and the request

use serde::Serialize;

use warden_core::UserId;

use crate::{Permission, PermissionRegistry, Principal};

/// Per-call input to [`decide`].
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationRequest<'a> {
    pub principal: &'a Principal,
    /// Route-level requirement. Empty means authentication only.
    pub required: &'a [Permission],
    /// Owner of the targeted resource, when the route names one.
    pub resource_owner: Option<&'a UserId>,
}

impl<'a> AuthorizationRequest<'a> {
    pub fn new(principal: &'a Principal, required: &'a [Permission]) -> Self {
        Self {
            principal,
            required,
            resource_owner: None,
        }
    }

    pub fn with_resource_owner(mut self, owner: Option<&'a UserId>) -> Self {
        self.resource_owner = owner;
        self
    }
}

/// Why a request was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowBasis {
    /// The route only requires an authenticated principal.
    NoPermissionsRequired,
    /// The principal's role holds every required permission.
    RoleGranted,
    /// The role falls short, but the principal owns the target resource.
    SelfAccess,
}

/// Outcome of [`decide`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow { basis: AllowBasis },
    /// `missing` lists required permissions the role lacks, deduplicated, in
    /// the order they were required.
    Deny { missing: Vec<Permission> },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }
}

/// Decide whether `request.principal` may proceed.
///
/// 1. Nothing required: allow.
/// 2. Role grants every required permission: allow.
/// 3. Principal owns the target resource: allow.
/// 4. Otherwise deny.
pub fn decide(registry: &PermissionRegistry, request: &AuthorizationRequest<'_>) -> Decision {
    if request.required.is_empty() {
        return Decision::Allow {
            basis: AllowBasis::NoPermissionsRequired,
        };
    }

    let granted = registry.permissions_for(request.principal.role);
    let mut missing: Vec<Permission> = Vec::new();
    for perm in request.required {
        if !granted.contains(perm) && !missing.contains(perm) {
            missing.push(*perm);
        }
    }

    if missing.is_empty() {
        return Decision::Allow {
            basis: AllowBasis::RoleGranted,
        };
    }

    match request.resource_owner {
        Some(owner) if request.principal.owns(owner) => Decision::Allow {
            basis: AllowBasis::SelfAccess,
        },
        _ => Decision::Deny { missing },
    }
}
