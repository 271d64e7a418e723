// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-scoped credentials and their cookie representation.
//!
//! The session is carried in two cookies. A renewed session is returned to
//! the caller as a [`CredentialRefresh`] value and written back as
//! `Set-Cookie` headers by the HTTP layer; nothing here touches global state.

use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};

/// Cookie holding the access token (JWT).
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
/// Cookie holding the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Lifetime of the refresh token cookie (30 days).
const REFRESH_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 30;

/// The credential presented with a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl Credential {
    pub fn new(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        let non_empty = |t: Option<String>| t.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        Self {
            access_token: non_empty(access_token),
            refresh_token: non_empty(refresh_token),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new(Some(token.into()), None)
    }

    /// Read session cookies, falling back to an `Authorization: Bearer` header
    /// for the access token.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut access_token = None;
        let mut refresh_token = None;

        for value in headers.get_all(COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for pair in value.split(';') {
                let Some((name, val)) = pair.trim().split_once('=') else {
                    continue;
                };
                match name.trim() {
                    ACCESS_TOKEN_COOKIE => access_token = Some(val.trim().to_string()),
                    REFRESH_TOKEN_COOKIE => refresh_token = Some(val.trim().to_string()),
                    _ => {}
                }
            }
        }

        if access_token.as_deref().is_none_or(str::is_empty) {
            access_token = headers
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string());
        }

        Self::new(access_token, refresh_token)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// A renewed session produced while resolving a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRefresh {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

impl CredentialRefresh {
    /// `Set-Cookie` values persisting the renewed session.
    pub fn set_cookie_headers(&self) -> Vec<HeaderValue> {
        [
            session_cookie(ACCESS_TOKEN_COOKIE, &self.access_token, self.expires_in),
            session_cookie(REFRESH_TOKEN_COOKIE, &self.refresh_token, REFRESH_COOKIE_MAX_AGE),
        ]
        .into_iter()
        .filter_map(|cookie| HeaderValue::from_str(&cookie).ok())
        .collect()
    }
}

/// `Set-Cookie` values that drop the session (sign-out).
pub fn clear_cookie_headers() -> Vec<HeaderValue> {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]
        .into_iter()
        .filter_map(|name| HeaderValue::from_str(&session_cookie(name, "", 0)).ok())
        .collect()
}

fn session_cookie(name: &str, value: &str, max_age: u64) -> String {
    format!("{name}={value}; Path=/; Max-Age={max_age}; HttpOnly; Secure; SameSite=Lax")
}
