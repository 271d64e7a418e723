// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Supabase auth (GoTrue) identity provider.
//!
//! ## Flow
//!
//! 1. Access token present: verify it locally (JWKS configured) or with
//!    `GET /auth/v1/user`.
//! 2. Access token missing or rejected, refresh token present: renew with
//!    `POST /auth/v1/token?grant_type=refresh_token` and hand the new
//!    session back as a [`CredentialRefresh`].
//! 3. Renewal rejected: no principal.
//!
//! Transport failures are returned as errors; the caller decides what they
//! mean for the request.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{
    error::IdentityError,
    jwks::{JwksManager, JwtVerifier},
    principal::Principal,
    Authenticated, Credential, CredentialRefresh, IdentityProvider,
};
use crate::config::BackendConfig;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: u64,
    user: Principal,
}

#[derive(Clone)]
pub struct SupabaseIdentity {
    user_endpoint: Url,
    health_endpoint: Url,
    token_endpoint: Url,
    logout_endpoint: Url,
    anon_key: String,
    verifier: Option<JwtVerifier>,
    client: reqwest::Client,
}

impl SupabaseIdentity {
    pub fn new(config: &BackendConfig) -> Result<Self, IdentityError> {
        let endpoint = |path: &str| {
            config
                .auth_endpoint(path)
                .map_err(|e| IdentityError::Unreachable(e.to_string()))
        };

        let mut token_endpoint = endpoint("token")?;
        token_endpoint
            .query_pairs_mut()
            .append_pair("grant_type", "refresh_token");

        let verifier = match &config.jwks_url {
            Some(url) => Some(JwtVerifier::new(
                JwksManager::new(url.as_str(), config.timeout)?,
                config.jwt_issuer.clone(),
            )),
            None => None,
        };

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        Ok(Self {
            user_endpoint: endpoint("user")?,
            health_endpoint: endpoint("health")?,
            token_endpoint,
            logout_endpoint: endpoint("logout")?,
            anon_key: config.anon_key.clone(),
            verifier,
            client,
        })
    }

    /// Local verifier, when JWKS verification is configured.
    pub fn verifier(&self) -> Option<&JwtVerifier> {
        self.verifier.as_ref()
    }

    async fn verify(&self, access_token: &str) -> Result<Principal, IdentityError> {
        match &self.verifier {
            Some(verifier) => verifier.verify(access_token).await,
            None => self.fetch_user(access_token).await,
        }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<Principal, IdentityError> {
        let response = self
            .client
            .get(self.user_endpoint.clone())
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| IdentityError::Decode(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(IdentityError::Rejected("access token rejected".to_string()))
            }
            status => Err(IdentityError::Status(status.as_u16())),
        }
    }

    async fn renew(&self, refresh_token: &str) -> Result<Option<Authenticated>, IdentityError> {
        let response = self
            .client
            .post(self.token_endpoint.clone())
            .header("apikey", &self.anon_key)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let session: SessionResponse = response
                    .json()
                    .await
                    .map_err(|e| IdentityError::Decode(e.to_string()))?;

                debug!(user_id = %session.user.id, "session renewed");

                Ok(Some(Authenticated {
                    principal: session.user,
                    access_token: session.access_token.clone(),
                    refresh: Some(CredentialRefresh {
                        access_token: session.access_token,
                        refresh_token: session.refresh_token,
                        expires_in: session.expires_in,
                    }),
                }))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("refresh token rejected");
                Ok(None)
            }
            status => Err(IdentityError::Status(status.as_u16())),
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn current_principal(
        &self,
        credential: &Credential,
    ) -> Result<Option<Authenticated>, IdentityError> {
        let Some(access_token) = credential.access_token() else {
            return match credential.refresh_token() {
                Some(refresh_token) => self.renew(refresh_token).await,
                None => Ok(None),
            };
        };

        match self.verify(access_token).await {
            Ok(principal) => Ok(Some(Authenticated {
                principal,
                access_token: access_token.to_string(),
                refresh: None,
            })),
            Err(e) if e.is_rejection() => {
                debug!(reason = %e, "access token rejected");
                match credential.refresh_token() {
                    Some(refresh_token) => self.renew(refresh_token).await,
                    None => Ok(None),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_out(&self, credential: &Credential) -> Result<(), IdentityError> {
        let Some(access_token) = credential.access_token() else {
            return Ok(());
        };

        let response = self
            .client
            .post(self.logout_endpoint.clone())
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        // An already-invalid session is as signed out as it gets.
        if response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(IdentityError::Status(response.status().as_u16()))
        }
    }

    async fn ready(&self) -> Result<(), IdentityError> {
        if let Some(verifier) = &self.verifier {
            if verifier.jwks().is_cached().await {
                return Ok(());
            }
            return verifier.jwks().refresh().await;
        }

        let response = self
            .client
            .get(self.health_endpoint.clone())
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(IdentityError::Status(response.status().as_u16()))
        }
    }
}
