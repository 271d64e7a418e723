// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Static, prefix-based path classification.
//!
//! | Path | Class |
//! |------|-------|
//! | `/login` | [`RouteClass::AuthEntry`] |
//! | `/login…`, `/auth/callback…` | [`RouteClass::Public`] |
//! | `/` | [`RouteClass::Root`] |
//! | anything else | [`RouteClass::Protected`] |

use serde::Serialize;
use utoipa::ToSchema;

/// The authentication entry (sign-in page).
pub const LOGIN_PATH: &str = "/login";
/// OAuth / magic-link callback.
pub const AUTH_CALLBACK_PATH: &str = "/auth/callback";
pub const ROOT_PATH: &str = "/";

const PUBLIC_PREFIXES: [&str; 2] = [LOGIN_PATH, AUTH_CALLBACK_PATH];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// Reachable without a principal.
    Public,
    /// The sign-in page; signed-in users are sent to their home instead.
    AuthEntry,
    /// `/`; dispatches signed-in users to their home.
    Root,
    /// Requires a principal.
    Protected,
}

impl RouteClass {
    pub fn requires_principal(&self) -> bool {
        *self == RouteClass::Protected
    }
}

/// Classify a request path. Query string and fragment are ignored.
pub fn classify(path: &str) -> RouteClass {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    if path.is_empty() || path == ROOT_PATH {
        RouteClass::Root
    } else if path == LOGIN_PATH {
        RouteClass::AuthEntry
    } else if PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        RouteClass::Public
    } else {
        RouteClass::Protected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_is_the_auth_entry() {
        assert_eq!(classify("/login"), RouteClass::AuthEntry);
        assert_eq!(classify("/login?next=/admin"), RouteClass::AuthEntry);
    }

    #[test]
    fn public_prefixes() {
        assert_eq!(classify("/login/reset"), RouteClass::Public);
        assert_eq!(classify("/auth/callback"), RouteClass::Public);
        assert_eq!(classify("/auth/callback?code=abc"), RouteClass::Public);
        // prefix match, as the web app does it
        assert_eq!(classify("/loginhelp"), RouteClass::Public);
    }

    #[test]
    fn root() {
        assert_eq!(classify("/"), RouteClass::Root);
        assert_eq!(classify("/?utm=x"), RouteClass::Root);
        assert_eq!(classify(""), RouteClass::Root);
    }

    #[test]
    fn everything_else_is_protected() {
        for path in ["/admin", "/admin/products", "/dashboard", "/audit/new", "/auth", "/v1/session"] {
            assert_eq!(classify(path), RouteClass::Protected, "{path}");
            assert!(classify(path).requires_principal());
        }
    }
}
