// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Resolver
//!
//! Decides, for each inbound request, whether it passes through or is
//! redirected, and where to.
//!
//! ## Policy
//!
//! | Principal | Path | Decision |
//! |-----------|------|----------|
//! | none | protected | redirect `/login` |
//! | present | `/login` | redirect to role home |
//! | present | `/` | redirect to role home |
//! | any | anything else | pass through |
//!
//! ## Failure Handling
//!
//! - Backend not configured: every request passes through (warned once)
//! - Identity provider error or timeout: treated as "no principal"
//! - Profile lookup error, timeout or miss: role falls back to the metadata
//!   hint, then to `field_worker`
//!
//! The resolver never returns an error and holds no per-request state.

use std::sync::{Arc, Once};
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::decision::{Decision, Resolution};
use super::routes::{classify, RouteClass, LOGIN_PATH};
use crate::config::{BackendConfig, DEFAULT_AUTH_TIMEOUT};
use crate::identity::{Authenticated, Credential, IdentityError, IdentityProvider, Principal, SupabaseIdentity};
use crate::profile::{Profile, ProfileError, ProfileStore, RestProfileStore, Role};

static UNCONFIGURED_WARNING: Once = Once::new();

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Profile lookup outcome when the caller needs to tell a miss from a failure.
#[derive(Debug, Error)]
pub enum ProfileLookupError {
    #[error("profile lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Store(#[from] ProfileError),
    #[error("backend not configured")]
    Unconfigured,
}

/// Result of a backend readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Ok,
    Unconfigured,
    Unavailable,
}

impl BackendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendStatus::Ok => "ok",
            BackendStatus::Unconfigured => "unconfigured",
            BackendStatus::Unavailable => "unavailable",
        }
    }
}

#[derive(Clone)]
struct Backend {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
}

#[derive(Clone)]
pub struct AccessResolver {
    backend: Option<Backend>,
    timeout: Duration,
}

impl AccessResolver {
    /// A resolver that enforces nothing.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            timeout: DEFAULT_AUTH_TIMEOUT,
        }
    }

    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            backend: Some(Backend { identity, profiles }),
            timeout: DEFAULT_AUTH_TIMEOUT,
        }
    }

    /// Bound on each external call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wire the Supabase collaborators, or run disabled without a config.
    pub fn from_config(config: Option<&BackendConfig>) -> Result<Self, BuildError> {
        let Some(config) = config else {
            return Ok(Self::disabled());
        };

        let identity = SupabaseIdentity::new(config)?;
        let profiles = RestProfileStore::new(config)?;

        Ok(Self::new(Arc::new(identity), Arc::new(profiles)).with_timeout(config.timeout))
    }

    /// Whether requests are actually checked.
    pub fn is_enforcing(&self) -> bool {
        self.backend.is_some()
    }

    /// Decide what happens to a request for `path` carrying `credential`.
    pub async fn resolve(&self, path: &str, credential: &Credential) -> Resolution {
        let Some(backend) = &self.backend else {
            UNCONFIGURED_WARNING.call_once(|| {
                warn!("backend credentials not configured, access enforcement disabled");
            });
            return Resolution::pass_through();
        };

        let class = classify(path);
        let authenticated = self.authenticate_with(backend, credential).await;

        let (decision, role) = match (&authenticated, class) {
            (None, RouteClass::Protected) => (Decision::redirect(LOGIN_PATH), None),
            (Some(auth), RouteClass::AuthEntry | RouteClass::Root) => {
                let role = self
                    .resolve_role(&auth.principal, Some(auth.access_token.as_str()))
                    .await;
                (Decision::redirect(role.home_path()), Some(role))
            }
            _ => (Decision::PassThrough, None),
        };

        debug!(
            path,
            class = ?class,
            authenticated = authenticated.is_some(),
            decision = ?decision,
            "access resolved"
        );

        Resolution {
            decision,
            authenticated,
            role,
        }
    }

    /// Resolve the principal behind `credential`; any failure is "none".
    pub async fn authenticate(&self, credential: &Credential) -> Option<Authenticated> {
        let backend = self.backend.as_ref()?;
        self.authenticate_with(backend, credential).await
    }

    async fn authenticate_with(
        &self,
        backend: &Backend,
        credential: &Credential,
    ) -> Option<Authenticated> {
        if credential.is_empty() {
            return None;
        }

        match timeout(self.timeout, backend.identity.current_principal(credential)).await {
            Ok(Ok(authenticated)) => authenticated,
            Ok(Err(e)) => {
                warn!(error = %e, code = e.error_code(), "identity lookup failed, treating as unauthenticated");
                None
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "identity lookup timed out, treating as unauthenticated");
                None
            }
        }
    }

    /// Map a principal to exactly one role.
    ///
    /// Profile row first, then the metadata hint, then `field_worker`.
    pub async fn resolve_role(&self, principal: &Principal, access_token: Option<&str>) -> Role {
        let profile = match self.fetch_profile(&principal.id, access_token).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id = %principal.id, error = %e, "profile lookup failed, using fallback role");
                None
            }
        };
        role_for(profile.as_ref(), principal)
    }

    /// Look up the profile of `principal_id`, bounded by the timeout.
    pub async fn fetch_profile(
        &self,
        principal_id: &str,
        access_token: Option<&str>,
    ) -> Result<Option<Profile>, ProfileLookupError> {
        let backend = self.backend.as_ref().ok_or(ProfileLookupError::Unconfigured)?;

        timeout(self.timeout, backend.profiles.get_profile(principal_id, access_token))
            .await
            .map_err(|_| ProfileLookupError::Timeout(self.timeout))?
            .map_err(ProfileLookupError::from)
    }

    /// Probe the identity provider.
    pub async fn backend_status(&self) -> BackendStatus {
        let Some(backend) = &self.backend else {
            return BackendStatus::Unconfigured;
        };

        match timeout(self.timeout, backend.identity.ready()).await {
            Ok(Ok(())) => BackendStatus::Ok,
            Ok(Err(e)) => {
                warn!(error = %e, "identity provider not ready");
                BackendStatus::Unavailable
            }
            Err(_) => BackendStatus::Unavailable,
        }
    }

    /// Revoke the session behind `credential`. Best effort.
    pub async fn sign_out(&self, credential: &Credential) {
        let Some(backend) = &self.backend else {
            return;
        };

        match timeout(self.timeout, backend.identity.sign_out(credential)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "sign-out failed"),
            Err(_) => warn!(timeout = ?self.timeout, "sign-out timed out"),
        }
    }
}

/// Role precedence: stored profile role, metadata hint, default.
///
/// The hint is only read when there is no row or its role is empty, since
/// the user can edit their own metadata.
pub fn role_for(profile: Option<&Profile>, principal: &Principal) -> Role {
    match profile.and_then(Profile::role) {
        Some(role) => role,
        None => principal.role_hint().unwrap_or_default(),
    }
}
