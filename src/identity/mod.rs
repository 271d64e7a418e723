// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Provider
//!
//! Turns the credential carried by a request into a [`Principal`].
//!
//! ## Auth Flow
//!
//! 1. The web client signs in against Supabase auth and stores the session
//!    in the `sb-access-token` / `sb-refresh-token` cookies
//! 2. Every request carries the cookies (or `Authorization: Bearer`)
//! 3. The provider verifies the access token and, if it has expired but the
//!    refresh token is still good, renews the session
//! 4. A renewed session travels back to the caller as an explicit
//!    [`CredentialRefresh`] value

pub mod credential;
pub mod error;
pub mod jwks;
pub mod principal;
pub mod supabase;

use async_trait::async_trait;

pub use credential::{clear_cookie_headers, Credential, CredentialRefresh};
pub use error::IdentityError;
pub use jwks::{JwksManager, JwtVerifier};
pub use principal::{Principal, PrincipalMetadata};
pub use supabase::SupabaseIdentity;

/// Outcome of a successful principal lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Authenticated {
    pub principal: Principal,
    /// The access token that is valid after this lookup.
    pub access_token: String,
    /// Set when the session had to be renewed.
    pub refresh: Option<CredentialRefresh>,
}

impl Authenticated {
    pub fn new(principal: Principal, access_token: impl Into<String>) -> Self {
        Self {
            principal,
            access_token: access_token.into(),
            refresh: None,
        }
    }
}

/// Session verification collaborator.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the principal behind `credential`.
    ///
    /// `Ok(None)` means unauthenticated. `Err` means no answer could be
    /// obtained.
    async fn current_principal(
        &self,
        credential: &Credential,
    ) -> Result<Option<Authenticated>, IdentityError>;

    /// Revoke the session behind `credential`.
    async fn sign_out(&self, credential: &Credential) -> Result<(), IdentityError>;

    /// Readiness probe.
    async fn ready(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}
