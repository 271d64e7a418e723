// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session and role home endpoints.
//!
//! These sit behind the access middleware and the profile checkpoint, so a
//! handler only runs for a signed-in user with a profile row.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::access::{AdminProfile, SessionProfile};
use crate::error::ApiError;
use crate::profile::{Role, Sector};

/// Response for GET /v1/session
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// User id (from the identity provider)
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<Sector>,
    /// Landing page for this role
    pub home: String,
}

impl From<SessionProfile> for SessionResponse {
    fn from(session: SessionProfile) -> Self {
        Self {
            sector: session.profile.sector(),
            email: session.profile.email.or(session.principal.email),
            full_name: session.profile.full_name,
            home: session.role.home_path().to_string(),
            role: session.role,
            user_id: session.principal.id,
        }
    }
}

/// Role home page payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct HomeView {
    /// Which home this is (`dashboard` or `admin`)
    pub view: String,
    pub session: SessionResponse,
}

/// Get the current user's session.
#[utoipa::path(
    get,
    path = "/v1/session",
    tag = "Session",
    responses(
        (status = 200, description = "Session information", body = SessionResponse),
        (status = 303, description = "Not signed in, or signed out for lack of a profile"),
        (status = 503, description = "Backend not configured or unavailable"),
    )
)]
pub async fn current_session(session: SessionProfile) -> Json<SessionResponse> {
    Json(session.into())
}

/// Field worker home.
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Session",
    responses(
        (status = 200, description = "Dashboard", body = HomeView),
        (status = 303, description = "Redirect to /login"),
    )
)]
pub async fn dashboard(session: SessionProfile) -> Json<HomeView> {
    Json(HomeView {
        view: "dashboard".to_string(),
        session: session.into(),
    })
}

/// Administrator home.
#[utoipa::path(
    get,
    path = "/admin",
    tag = "Session",
    responses(
        (status = 200, description = "Admin dashboard", body = HomeView),
        (status = 303, description = "Redirect to /login or the caller's own home"),
    )
)]
pub async fn admin(AdminProfile(session): AdminProfile) -> Json<HomeView> {
    Json(HomeView {
        view: "admin".to_string(),
        session: session.into(),
    })
}

/// Pages this service does not render itself.
pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "page not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Principal;
    use crate::profile::Profile;

    #[test]
    fn session_response_from_session_profile() {
        let session = SessionProfile {
            principal: Principal::new("user_123").with_email("agent@ensul.tl"),
            profile: Profile::new("user_123", Role::FieldWorker)
                .with_sector(Sector::Ensul)
                .with_full_name("Agent"),
            role: Role::FieldWorker,
        };

        let response: SessionResponse = session.into();
        assert_eq!(response.user_id, "user_123");
        assert_eq!(response.role, Role::FieldWorker);
        assert_eq!(response.sector, Some(Sector::Ensul));
        assert_eq!(response.email.as_deref(), Some("agent@ensul.tl"));
        assert_eq!(response.home, "/dashboard");
    }
}
