//! Role → permission registry.
//!
//! The registry is a total function over [`Role`]: every role has an entry,
//! possibly empty. It is built once per process from a static grant table and
//! only read afterwards, so concurrent requests share it without locking.

use std::sync::OnceLock;

use thiserror::Error;

use crate::{Permission, PermissionSet, Role};

/// Built-in grant table.
///
/// `user` holds nothing role-wide; it reaches its own resources through the
/// self-access rule in [`crate::decide`].
pub const DEFAULT_GRANTS: &[(Role, &[Permission])] = &[
    (Role::User, &[]),
    (
        Role::Admin,
        &[
            Permission::GetUsers,
            Permission::ManageUsers,
            Permission::ManageTokens,
            Permission::GetTokens,
        ],
    ),
];

static GLOBAL: OnceLock<PermissionRegistry> = OnceLock::new();

/// Configuration defects detected while building a registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("role '{0}' has no entry in the grant table")]
    MissingRole(Role),

    #[error("role '{0}' is listed more than once in the grant table")]
    DuplicateRole(Role),
}

/// Immutable mapping from role to granted permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRegistry {
    grants: [PermissionSet; Role::COUNT],
}

impl PermissionRegistry {
    /// Build a registry from a grant table.
    ///
    /// Every role must appear exactly once. Repeated permissions within a
    /// role collapse into one.
    pub fn from_grants(table: &[(Role, &[Permission])]) -> Result<Self, RegistryError> {
        let mut slots: [Option<PermissionSet>; Role::COUNT] = Default::default();

        for (role, perms) in table {
            let slot = &mut slots[role.index()];
            if slot.is_some() {
                return Err(RegistryError::DuplicateRole(*role));
            }
            *slot = Some(perms.iter().copied().collect());
        }

        for role in Role::ALL {
            if slots[role.index()].is_none() {
                return Err(RegistryError::MissingRole(role));
            }
        }

        Ok(Self {
            grants: slots.map(Option::unwrap_or_default),
        })
    }

    /// The process-wide registry, built from [`DEFAULT_GRANTS`] on first use.
    ///
    /// Panics if the built-in table is malformed: that is a defect in this
    /// crate, not a per-request condition.
    pub fn global() -> &'static PermissionRegistry {
        GLOBAL.get_or_init(|| {
            let registry = Self::from_grants(DEFAULT_GRANTS)
                .unwrap_or_else(|e| panic!("built-in grant table is invalid: {e}"));
            tracing::debug!(roles = Role::COUNT, "permission registry initialized");
            registry
        })
    }

    /// Permissions granted to `role` (possibly empty).
    pub fn permissions_for(&self, role: Role) -> &PermissionSet {
        &self.grants[role.index()]
    }

    pub fn has(&self, role: Role, permission: Permission) -> bool {
        self.permissions_for(role).contains(&permission)
    }

    /// Every role, in declaration order.
    pub fn all_roles(&self) -> &'static [Role] {
        &Role::ALL
    }

    /// Roles paired with their grants, in declaration order.
    pub fn roles(&self) -> impl Iterator<Item = (Role, &PermissionSet)> + '_ {
        Role::ALL.into_iter().map(move |role| (role, self.permissions_for(role)))
    }
}
