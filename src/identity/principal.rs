// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated principal as reported by the identity provider.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::profile::Role;

/// User metadata set when the account was created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrincipalMetadata {
    /// Role hint (e.g. `admin`), used when no profile row exists yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Everything else the provider stored.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// An authenticated identity.
///
/// Only `id` and `metadata` matter to access decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// Canonical user id (the token `sub`).
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, alias = "user_metadata")]
    pub metadata: PrincipalMetadata,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            metadata: PrincipalMetadata::default(),
        }
    }

    pub fn with_role_hint(mut self, role: impl Into<String>) -> Self {
        self.metadata.role = Some(role.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Role carried in the metadata, if recognised.
    pub fn role_hint(&self) -> Option<Role> {
        self.metadata.role.as_deref().and_then(Role::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_hint_parses_metadata() {
        assert_eq!(Principal::new("u").with_role_hint("admin").role_hint(), Some(Role::Admin));
        assert_eq!(Principal::new("u").with_role_hint("").role_hint(), None);
        assert_eq!(Principal::new("u").role_hint(), None);
    }

    #[test]
    fn deserializes_provider_user() {
        let body = r#"{
            "id": "u-1",
            "email": "boss@central.tl",
            "user_metadata": {"role": "admin", "full_name": "Boss"},
            "aud": "authenticated"
        }"#;
        let principal: Principal = serde_json::from_str(body).unwrap();
        assert_eq!(principal.id, "u-1");
        assert_eq!(principal.role_hint(), Some(Role::Admin));
        assert_eq!(principal.metadata.extra["full_name"], "Boss");
    }
}
