// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resolver output.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::identity::{Authenticated, CredentialRefresh, Principal};
use crate::profile::Role;

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    /// Let the request reach the page.
    PassThrough,
    /// Send the client elsewhere.
    Redirect { target: String },
}

impl Decision {
    pub fn redirect(target: impl Into<String>) -> Self {
        Decision::Redirect {
            target: target.into(),
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Decision::PassThrough)
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Decision::Redirect { target } => Some(target),
            Decision::PassThrough => None,
        }
    }
}

/// A decision plus what was learned while making it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub decision: Decision,
    /// The principal, when one was resolved.
    pub authenticated: Option<Authenticated>,
    /// The role, when the decision needed it.
    pub role: Option<Role>,
}

impl Resolution {
    pub fn pass_through() -> Self {
        Self {
            decision: Decision::PassThrough,
            authenticated: None,
            role: None,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.authenticated.as_ref().map(|a| &a.principal)
    }

    /// Renewed session to hand back to the client.
    pub fn refresh(&self) -> Option<&CredentialRefresh> {
        self.authenticated.as_ref().and_then(|a| a.refresh.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape() {
        assert_eq!(
            serde_json::to_value(Decision::PassThrough).unwrap(),
            serde_json::json!({"action": "pass_through"})
        );
        assert_eq!(
            serde_json::to_value(Decision::redirect("/login")).unwrap(),
            serde_json::json!({"action": "redirect", "target": "/login"})
        );
    }

    #[test]
    fn target_accessor() {
        assert_eq!(Decision::redirect("/admin").target(), Some("/admin"));
        assert_eq!(Decision::PassThrough.target(), None);
        assert!(Decision::PassThrough.is_pass_through());
    }
}
