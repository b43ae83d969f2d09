//! Common types for the shared crate

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type (Unix milliseconds)
pub type Timestamp = i64;

/// Caller role carried in the JWT `role` claim
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    /// Venue owner
    Owner,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Owner => "owner",
            Self::User => "user",
        }
    }

    /// Unknown role names degrade to `User`
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "owner" | "venue_owner" => Self::Owner,
            _ => Self::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission(pub String);

impl Permission {
    /// Check if this permission grants access to the given resource action
    pub fn grants(&self, action: &str) -> bool {
        if self.0 == "*" {
            return true;
        }
        if let Some(prefix) = self.0.strip_suffix(":*") {
            return action.starts_with(prefix);
        }
        self.0 == action
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Admin"), Role::Admin);
        assert_eq!(Role::parse("owner"), Role::Owner);
        assert_eq!(Role::parse("guest"), Role::User);
    }

    #[test]
    fn test_permission_grants() {
        assert!(Permission("*".into()).grants("bookings:cancel"));
        assert!(Permission("bookings:*".into()).grants("bookings:cancel"));
        assert!(!Permission("coupons:*".into()).grants("bookings:cancel"));
        assert!(Permission("venues:write".into()).grants("venues:write"));
    }
}
