// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS fetching, caching, and local access token verification.
//!
//! When `SUPABASE_JWKS_URL` is configured, access tokens are verified
//! locally against the project's signing keys instead of calling the auth
//! API on every request. Keys are cached with a TTL. A token signed with a
//! key the cache does not know triggers one refetch, at most once per
//! [`MIN_REFETCH_INTERVAL`], so rotated keys are picked up early.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::error::IdentityError;
use super::principal::{Principal, PrincipalMetadata};

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum age of the cached set before an unknown `kid` may refetch it.
pub const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Audience Supabase stamps on user sessions.
const SESSION_AUDIENCE: &str = "authenticated";

struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// JWKS manager with caching.
#[derive(Clone)]
pub struct JwksManager {
    jwks_url: String,
    cache_ttl: Duration,
    min_refetch_interval: Duration,
    cache: Arc<RwLock<Option<CacheEntry>>>,
    client: reqwest::Client,
}

impl JwksManager {
    pub fn new(jwks_url: impl Into<String>, timeout: Duration) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        Ok(Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            min_refetch_interval: MIN_REFETCH_INTERVAL,
            cache: Arc::new(RwLock::new(None)),
            client,
        })
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_min_refetch_interval(mut self, interval: Duration) -> Self {
        self.min_refetch_interval = interval;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    async fn get_jwks(&self) -> Result<JwkSet, IdentityError> {
        Ok(self.cached_or_fetch().await?.0)
    }

    /// The key set and how long ago it was fetched.
    async fn cached_or_fetch(&self) -> Result<(JwkSet, Duration), IdentityError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                let age = entry.fetched_at.elapsed();
                if age < self.cache_ttl {
                    return Ok((entry.jwks.clone(), age));
                }
            }
        }

        let jwks = self.fetch_jwks().await?;
        self.store(jwks.clone()).await;
        Ok((jwks, Duration::ZERO))
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, IdentityError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::Status(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))
    }

    async fn store(&self, jwks: JwkSet) {
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        });
    }

    /// Get a decoding key for the given key ID.
    ///
    /// An unknown `kid` refetches the set once, unless the cached copy is
    /// younger than the minimum refetch interval.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), IdentityError> {
        let (jwks, age) = self.cached_or_fetch().await?;
        if let Some(jwk) = find_key(&jwks, kid) {
            return jwk_to_decoding_key(jwk);
        }
        if age < self.min_refetch_interval {
            return Err(IdentityError::Key(format!("kid {kid}")));
        }

        debug!(kid, "unknown kid, refetching key set");
        let jwks = self.fetch_jwks().await?;
        self.store(jwks.clone()).await;

        let jwk = find_key(&jwks, kid).ok_or_else(|| IdentityError::Key(format!("kid {kid}")))?;
        jwk_to_decoding_key(jwk)
    }

    /// Get any usable decoding key (for tokens without kid).
    pub async fn get_any_decoding_key(&self) -> Result<(DecodingKey, Algorithm), IdentityError> {
        let jwks = self.get_jwks().await?;

        jwks.keys
            .iter()
            .find_map(|jwk| jwk_to_decoding_key(jwk).ok())
            .ok_or_else(|| IdentityError::Key("empty key set".to_string()))
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), IdentityError> {
        let jwks = self.fetch_jwks().await?;
        self.store(jwks).await;
        Ok(())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
    }
}

fn find_key<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys.iter().find(|k| k.common.key_id.as_deref() == Some(kid))
}

fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), IdentityError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| IdentityError::Key(format!("RSA key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                _ => Algorithm::RS256,
            };
            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| IdentityError::Key(format!("EC key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };
            Ok((key, alg))
        }
        _ => Err(IdentityError::Key("unsupported key type".to_string())),
    }
}

/// Claims of a Supabase access token.
#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<PrincipalMetadata>,
}

/// Local access token verifier.
#[derive(Clone)]
pub struct JwtVerifier {
    jwks: Arc<JwksManager>,
    issuer: String,
}

impl JwtVerifier {
    pub fn new(jwks: JwksManager, issuer: impl Into<String>) -> Self {
        Self {
            jwks: Arc::new(jwks),
            issuer: issuer.into(),
        }
    }

    pub fn jwks(&self) -> &JwksManager {
        &self.jwks
    }

    /// Verify signature, issuer, audience and expiry, and build the principal.
    pub async fn verify(&self, token: &str) -> Result<Principal, IdentityError> {
        let header = decode_header(token)?;

        let (decoding_key, algorithm) = match &header.kid {
            Some(kid) => self.jwks.get_decoding_key(kid).await?,
            None => self.jwks.get_any_decoding_key().await?,
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[SESSION_AUDIENCE]);

        let claims = decode::<SessionClaims>(token, &decoding_key, &validation)?.claims;
        Ok(claims.into_principal())
    }
}

impl SessionClaims {
    fn into_principal(self) -> Principal {
        Principal {
            id: self.sub,
            email: self.email,
            metadata: self.user_metadata.unwrap_or_default(),
        }
    }
}
