//! Authentication and authorization module
//!
//! Provides JWT-based authentication and role-based access control.

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, TokenPair, create_tokens, decode_token, refresh_tokens};
pub use middleware::{auth_middleware, require_role};
pub use password::{hash_password, verify_password};

use serde::{Deserialize, Serialize};

/// User roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can read dashboards and lists
    Viewer,
    /// Can submit items for AI analysis and edit records
    Analyst,
    /// Can manage users and close out tickets
    Admin,
}

impl Role {
    pub fn can_analyze(&self) -> bool {
        matches!(self, Role::Analyst | Role::Admin)
    }

    pub fn can_manage(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Parse a stored role column; anything unrecognized degrades to viewer
    pub fn parse(s: &str) -> Role {
        match s {
            "admin" => Role::Admin,
            "analyst" => Role::Analyst,
            _ => Role::Viewer,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Viewer
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Viewer => write!(f, "viewer"),
            Role::Analyst => write!(f, "analyst"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(!Role::Viewer.can_analyze());
        assert!(Role::Analyst.can_analyze());
        assert!(!Role::Analyst.can_manage());
        assert!(Role::Admin.can_manage());
    }

    #[test]
    fn test_role_parse_defaults_to_viewer() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("analyst"), Role::Analyst);
        assert_eq!(Role::parse("anything-else"), Role::Viewer);
    }
}
