// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Profile Store
//!
//! Profiles live in the backend `users` table, keyed by the identity
//! provider's user id. The profile is authoritative for the user's role, but
//! it is provisioned asynchronously and may be missing for a principal that
//! already exists. A miss is reported as `Ok(None)`, never as an error.

pub mod memory;
pub mod rest;
pub mod roles;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub use memory::InMemoryProfileStore;
pub use rest::RestProfileStore;
pub use roles::{Role, Sector};

/// A row of the `users` table.
///
/// `role` and `sector` are kept as stored so that an unexpected value does
/// not fail the whole lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: None,
            full_name: None,
            role: Some(role.to_string()),
            sector: None,
            created_at: None,
        }
    }

    pub fn with_sector(mut self, sector: Sector) -> Self {
        self.sector = Some(sector.to_string());
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Stored role. `None` only when the field is empty; any other value
    /// that is not a known role is read as `field_worker`.
    pub fn role(&self) -> Option<Role> {
        let role = self.role.as_deref().map(str::trim).filter(|r| !r.is_empty())?;
        Some(Role::parse(role).unwrap_or(Role::FieldWorker))
    }

    pub fn sector(&self) -> Option<Sector> {
        match self.sector.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("central") => Some(Sector::Central),
            Some(s) if s.eq_ignore_ascii_case("ensul") => Some(Sector::Ensul),
            _ => None,
        }
    }
}

/// Profile lookup failures (transport level only).
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile store unreachable: {0}")]
    Unreachable(String),
    #[error("profile store returned HTTP {0}")]
    Status(u16),
    #[error("malformed profile response: {0}")]
    Decode(String),
}

/// Keyed lookup of persisted profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile of `principal_id`.
    ///
    /// `access_token` is the caller's verified token, forwarded so that row
    /// level security applies. `None` falls back to the anon key.
    async fn get_profile(
        &self,
        principal_id: &str,
        access_token: Option<&str>,
    ) -> Result<Option<Profile>, ProfileError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_role_is_absent() {
        let mut profile = Profile::new("u1", Role::Admin);
        profile.role = Some(String::new());
        assert_eq!(profile.role(), None);
        profile.role = None;
        assert_eq!(profile.role(), None);
        profile.role = Some("  ".into());
        assert_eq!(profile.role(), None);
    }

    #[test]
    fn unknown_role_is_field_worker() {
        let mut profile = Profile::new("u1", Role::Admin);
        profile.role = Some("auditor".into());
        assert_eq!(profile.role(), Some(Role::FieldWorker));
    }

    #[test]
    fn deserializes_database_row() {
        let row = r#"{
            "id": "6a1f",
            "email": "agent@central.tl",
            "full_name": "Agent",
            "role": "field_worker",
            "sector": "Central",
            "created_at": "2026-01-05T10:00:00Z"
        }"#;
        let profile: Profile = serde_json::from_str(row).unwrap();
        assert_eq!(profile.role(), Some(Role::FieldWorker));
        assert_eq!(profile.sector(), Some(Sector::Central));
        assert!(profile.created_at.is_some());
    }

    #[test]
    fn unknown_sector_is_absent() {
        let row = r#"{"id": "x", "role": "admin", "sector": "Mars"}"#;
        let profile: Profile = serde_json::from_str(row).unwrap();
        assert_eq!(profile.role(), Some(Role::Admin));
        assert_eq!(profile.sector(), None);
    }
}
