// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles and sectors.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Home path for administrators.
pub const ADMIN_HOME: &str = "/admin";
/// Home path for field workers.
pub const FIELD_WORKER_HOME: &str = "/dashboard";

/// User roles for routing and authorization.
///
/// - `Admin` - Reviews and exports all audits, manages catalog data
/// - `FieldWorker` - Records price audits for their sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administrator
    Admin,
    /// Field worker (default)
    FieldWorker,
}

impl Role {
    /// Parse role from string (case-insensitive).
    ///
    /// Used for both the profile row and the identity metadata hint.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrator" => Some(Role::Admin),
            "field_worker" | "field-worker" | "fieldworker" => Some(Role::FieldWorker),
            _ => None,
        }
    }

    /// Landing page for this role.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Admin => ADMIN_HOME,
            Role::FieldWorker => FIELD_WORKER_HOME,
        }
    }

    pub fn is_admin(&self) -> bool {
        *self == Role::Admin
    }
}

impl Default for Role {
    /// Default role is FieldWorker (least privilege for authenticated users).
    fn default() -> Self {
        Role::FieldWorker
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::FieldWorker => write!(f, "field_worker"),
        }
    }
}

/// Business sector used to partition audit data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Sector {
    Central,
    Ensul,
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sector::Central => write!(f, "Central"),
            Sector::Ensul => write!(f, "Ensul"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_spellings() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("administrator"), Some(Role::Admin));
        assert_eq!(Role::parse("field_worker"), Some(Role::FieldWorker));
        assert_eq!(Role::parse("Field-Worker"), Some(Role::FieldWorker));
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("auditor"), None);
    }

    #[test]
    fn home_paths() {
        assert_eq!(Role::Admin.home_path(), "/admin");
        assert_eq!(Role::FieldWorker.home_path(), "/dashboard");
    }

    #[test]
    fn default_role_is_field_worker() {
        assert_eq!(Role::default(), Role::FieldWorker);
    }

    #[test]
    fn serde_uses_database_spelling() {
        assert_eq!(serde_json::to_string(&Role::FieldWorker).unwrap(), "\"field_worker\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let sector: Sector = serde_json::from_str("\"Ensul\"").unwrap();
        assert_eq!(sector, Sector::Ensul);
    }
}
