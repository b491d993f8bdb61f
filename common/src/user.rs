//! User credential descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in role granting read and write on one database.
pub const READ_WRITE_ROLE: &str = "readWrite";

/// A role granted on a specific database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Role name, e.g. `readWrite`.
    pub role: String,
    /// Database the role applies to.
    pub db: String,
}

impl RoleGrant {
    /// Create a new role grant.
    pub fn new(role: impl Into<String>, db: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            db: db.into(),
        }
    }
}

/// Everything `createUser` needs.
#[derive(Clone, PartialEq, Eq)]
pub struct UserDescriptor {
    /// User name.
    pub user: String,
    /// Clear-text password. Never logged.
    pub password: String,
    /// Granted roles.
    pub roles: Vec<RoleGrant>,
}

impl UserDescriptor {
    /// A user with `readWrite` on exactly one database.
    pub fn read_write(
        user: impl Into<String>,
        password: impl Into<String>,
        db: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            roles: vec![RoleGrant::new(READ_WRITE_ROLE, db)],
        }
    }
}

impl fmt::Debug for UserDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDescriptor")
            .field("user", &self.user)
            .field("password", &"***")
            .field("roles", &self.roles)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_scoped_to_one_db() {
        let user = UserDescriptor::read_write("app", "s3cret", "appdb");
        assert_eq!(user.roles, vec![RoleGrant::new("readWrite", "appdb")]);
    }

    #[test]
    fn test_debug_hides_password() {
        let user = UserDescriptor::read_write("app", "s3cret", "appdb");
        let debug = format!("{:?}", user);
        assert!(debug.contains("app"));
        assert!(!debug.contains("s3cret"));
    }
}
