//! Process configuration, read from environment variables.

use std::net::{AddrParseError, SocketAddr};

use thiserror::Error;

use warden_auth::Role;
use warden_core::UserId;

const DEV_JWT_SECRET: &str = "dev-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_OWNER_PARAM: &str = "userId";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a socket address ('{value}'): {source}")]
    InvalidAddr {
        var: &'static str,
        value: String,
        #[source]
        source: AddrParseError,
    },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{var} '{value}' is not a route parameter name ([A-Za-z_][A-Za-z0-9_]*)")]
    InvalidOwnerParam { var: &'static str, value: String },

    #[error("{var} entry '{entry}' must look like <id>:<role>")]
    InvalidUser { var: &'static str, entry: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HS256 secret for access tokens (`JWT_SECRET`).
    pub jwt_secret: String,
    /// Listen address (`WARDEN_BIND_ADDR`).
    pub bind_addr: SocketAddr,
    /// Path parameter naming the owner of user-scoped resources
    /// (`WARDEN_OWNER_PARAM`).
    pub owner_param: String,
    /// Users seeded into the in-memory directory (`WARDEN_USERS`,
    /// comma-separated `<id>:<role>`).
    pub users: Vec<(UserId, Role)>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });
        if jwt_secret.is_empty() {
            return Err(ConfigError::Empty("JWT_SECRET"));
        }

        let addr = lookup("WARDEN_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = addr.parse().map_err(|source| ConfigError::InvalidAddr {
            var: "WARDEN_BIND_ADDR",
            value: addr.clone(),
            source,
        })?;

        let owner_param =
            lookup("WARDEN_OWNER_PARAM").unwrap_or_else(|| DEFAULT_OWNER_PARAM.to_string());
        if owner_param.is_empty() {
            return Err(ConfigError::Empty("WARDEN_OWNER_PARAM"));
        }
        if !is_param_name(&owner_param) {
            return Err(ConfigError::InvalidOwnerParam {
                var: "WARDEN_OWNER_PARAM",
                value: owner_param,
            });
        }

        let users = match lookup("WARDEN_USERS") {
            Some(raw) => parse_users(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            jwt_secret,
            bind_addr,
            owner_param,
            users,
        })
    }
}

/// Path parameter names are spliced into route templates, so they must not
/// carry separators or capture syntax.
fn is_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_users(raw: &str) -> Result<Vec<(UserId, Role)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> Result<(UserId, Role), ConfigError> {
            let invalid = || ConfigError::InvalidUser {
                var: "WARDEN_USERS",
                entry: entry.to_string(),
            };
            let (id, role) = entry.split_once(':').ok_or_else(invalid)?;
            let id = UserId::new(id.trim()).map_err(|_| invalid())?;
            let role = role.trim().parse::<Role>().map_err(|_| invalid())?;
            Ok((id, role))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.owner_param, "userId");
        assert!(cfg.users.is_empty());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("JWT_SECRET", "s3cret"),
            ("WARDEN_BIND_ADDR", "127.0.0.1:9000"),
            ("WARDEN_OWNER_PARAM", "ownerId"),
            ("WARDEN_USERS", "a1:admin, u1:user,"),
        ])
        .unwrap();
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.owner_param, "ownerId");
        assert_eq!(
            cfg.users,
            vec![
                (UserId::new("a1").unwrap(), Role::Admin),
                (UserId::new("u1").unwrap(), Role::User),
            ]
        );
    }

    #[test]
    fn accepts_identifier_owner_params() {
        for good in ["userId", "_owner", "owner_id2"] {
            assert_eq!(config(&[("WARDEN_OWNER_PARAM", good)]).unwrap().owner_param, good);
        }
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("WARDEN_BIND_ADDR", "nowhere")]),
            Err(ConfigError::InvalidAddr { .. })
        ));
        assert!(matches!(
            config(&[("JWT_SECRET", "")]),
            Err(ConfigError::Empty("JWT_SECRET"))
        ));
        for bad in ["user/id", ":userId", "*rest", "{id}", "user id", " userId", "9id"] {
            assert!(
                matches!(
                    config(&[("WARDEN_OWNER_PARAM", bad)]),
                    Err(ConfigError::InvalidOwnerParam { .. })
                ),
                "accepted owner param {bad:?}"
            );
        }
        assert!(matches!(
            config(&[("WARDEN_OWNER_PARAM", "")]),
            Err(ConfigError::Empty("WARDEN_OWNER_PARAM"))
        ));
        assert!(matches!(
            config(&[("WARDEN_USERS", "a1:root")]),
            Err(ConfigError::InvalidUser { .. })
        ));
        assert!(matches!(
            config(&[("WARDEN_USERS", "justanid")]),
            Err(ConfigError::InvalidUser { .. })
        ));
    }
}
