use serde::{Deserialize, Serialize};

use warden_core::UserId;

use crate::Role;

/// Authenticated identity.
///
/// Produced by a [`crate::CredentialVerifier`]; the gate only passes it along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Whether this principal is the owner identified by `owner`.
    pub fn owns(&self, owner: &UserId) -> bool {
        &self.id == owner
    }
}
