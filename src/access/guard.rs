// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Page-level checkpoint for the protected surface.
//!
//! Stricter than the routing policy: a page needs both a principal and a
//! profile row. A principal without a profile is signed out and sent back to
//! `/login`, since the pages cannot be rendered without a role and sector.
//!
//! ```rust,ignore
//! async fn dashboard(SessionProfile { profile, .. }: SessionProfile) -> impl IntoResponse {
//!     // profile is the caller's `users` row
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

use super::middleware::append_set_cookies;
use super::routes::LOGIN_PATH;
use crate::error::ApiError;
use crate::identity::{clear_cookie_headers, Authenticated, Credential, Principal};
use crate::profile::{Profile, Role};
use crate::state::AppState;

/// Why a page request was turned away.
#[derive(Debug)]
pub enum GuardRejection {
    /// No principal.
    Unauthenticated,
    /// Principal without profile; the session has been revoked.
    SignedOut,
    /// Signed in, but the page belongs to another role.
    WrongRole { home: &'static str },
    /// Backend missing or not answering.
    Unavailable(String),
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            GuardRejection::Unauthenticated => Redirect::to(LOGIN_PATH).into_response(),
            GuardRejection::SignedOut => {
                let mut response = Redirect::to(LOGIN_PATH).into_response();
                append_set_cookies(response.headers_mut(), clear_cookie_headers());
                response
            }
            GuardRejection::WrongRole { home } => Redirect::to(home).into_response(),
            GuardRejection::Unavailable(message) => ApiError::unavailable(message).into_response(),
        }
    }
}

/// The signed-in caller together with their profile row.
#[derive(Debug, Clone)]
pub struct SessionProfile {
    pub principal: Principal,
    pub profile: Profile,
    pub role: Role,
}

impl FromRequestParts<AppState> for SessionProfile {
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let resolver = &state.resolver;
        if !resolver.is_enforcing() {
            return Err(GuardRejection::Unavailable(
                "backend not configured".to_string(),
            ));
        }

        // The middleware has usually done this already.
        let authenticated = match parts.extensions.get::<Authenticated>().cloned() {
            Some(authenticated) => authenticated,
            None => resolver
                .authenticate(&Credential::from_headers(&parts.headers))
                .await
                .ok_or(GuardRejection::Unauthenticated)?,
        };

        let Authenticated {
            principal,
            access_token,
            ..
        } = authenticated;

        match resolver.fetch_profile(&principal.id, Some(access_token.as_str())).await {
            Ok(Some(profile)) => {
                // Pages trust the row only, never the user-editable metadata.
                let role = profile.role().unwrap_or_default();
                Ok(SessionProfile {
                    principal,
                    profile,
                    role,
                })
            }
            Ok(None) => {
                info!(user_id = %principal.id, "no profile row, signing out");
                resolver.sign_out(&Credential::bearer(access_token)).await;
                Err(GuardRejection::SignedOut)
            }
            Err(e) => {
                warn!(user_id = %principal.id, error = %e, "profile lookup failed");
                Err(GuardRejection::Unavailable(e.to_string()))
            }
        }
    }
}

/// Like [`SessionProfile`], restricted to administrators.
///
/// Other roles are redirected to their own home.
#[derive(Debug, Clone)]
pub struct AdminProfile(pub SessionProfile);

impl FromRequestParts<AppState> for AdminProfile {
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = SessionProfile::from_request_parts(parts, state).await?;

        if !session.role.is_admin() {
            return Err(GuardRejection::WrongRole {
                home: session.role.home_path(),
            });
        }

        Ok(AdminProfile(session))
    }
}
