use std::collections::BTreeSet;

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use warden_core::DomainError;

/// Capability a role may hold.
///
/// Ordering follows declaration order, so a [`PermissionSet`] iterates the
/// same way every time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    GetUsers,
    ManageUsers,
    ManageTokens,
    GetTokens,
}

/// Set of permissions granted to a role.
pub type PermissionSet = BTreeSet<Permission>;

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Permission; 4] = [
        Permission::GetUsers,
        Permission::ManageUsers,
        Permission::ManageTokens,
        Permission::GetTokens,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::GetUsers => "getUsers",
            Permission::ManageUsers => "manageUsers",
            Permission::ManageTokens => "manageTokens",
            Permission::GetTokens => "getTokens",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown permission '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for perm in Permission::ALL {
            assert_eq!(perm.as_str().parse::<Permission>().unwrap(), perm);
        }
        assert!("deleteEverything".parse::<Permission>().is_err());
    }

    #[test]
    fn serde_matches_display() {
        for perm in Permission::ALL {
            let json = serde_json::to_string(&perm).unwrap();
            assert_eq!(json, format!("\"{perm}\""));
        }
    }
}
