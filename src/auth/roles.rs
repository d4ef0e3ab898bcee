// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles carried in the session.

use serde::{Deserialize, Serialize};

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Reviews reports, approves rewards
/// - `Citizen` - Submits reports and claims own rewards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Report reviewer
    Admin,
    /// Reporting user
    #[default]
    Citizen,
}

impl Role {
    /// Parse role from string (case-insensitive).
    ///
    /// The backend historically issued `user` for ordinary accounts.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "citizen" | "user" => Some(Role::Citizen),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Citizen => write!(f, "citizen"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_legacy_user_role() {
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::Citizen));
        assert_eq!(Role::parse("auditor"), None);
    }

    #[test]
    fn default_role_is_citizen() {
        assert_eq!(Role::default(), Role::Citizen);
    }
}
