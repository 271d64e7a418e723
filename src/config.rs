// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SUPABASE_URL` | Backend base URL | Required for enforcement |
//! | `SUPABASE_ANON_KEY` | Backend anon API key | Required for enforcement |
//! | `SUPABASE_JWKS_URL` | JWKS endpoint for local token verification | Optional |
//! | `SUPABASE_JWT_ISSUER` | Expected JWT issuer claim | `<SUPABASE_URL>/auth/v1` |
//! | `AUTH_TIMEOUT_MS` | Bound on each identity/profile call | `3000` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` | PEM certificate chain (HTTPS when set with key) | Optional |
//! | `TLS_KEY_PATH` | PEM private key | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! When either `SUPABASE_URL` or `SUPABASE_ANON_KEY` is missing the access
//! resolver runs disabled and lets every request through.

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use thiserror::Error;
use tracing::warn;
use url::Url;

pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const SUPABASE_JWKS_URL_ENV: &str = "SUPABASE_JWKS_URL";
pub const SUPABASE_JWT_ISSUER_ENV: &str = "SUPABASE_JWT_ISSUER";
pub const AUTH_TIMEOUT_MS_ENV: &str = "AUTH_TIMEOUT_MS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default bound on a single call to the identity provider or profile store.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_millis(3000);

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },
}

/// Managed backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL of the Supabase project, always with a trailing slash.
    pub url: Url,
    pub anon_key: String,
    pub jwks_url: Option<Url>,
    pub jwt_issuer: String,
    pub timeout: Duration,
}

impl BackendConfig {
    /// Build a backend config from the two required values.
    pub fn new(url: &str, anon_key: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        let anon_key = anon_key.trim();
        if url.is_empty() {
            return Err(ConfigError::Missing(SUPABASE_URL_ENV));
        }
        if anon_key.is_empty() {
            return Err(ConfigError::Missing(SUPABASE_ANON_KEY_ENV));
        }

        let mut url = parse_url(SUPABASE_URL_ENV, url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        let jwt_issuer = format!("{}auth/v1", url);

        Ok(Self {
            url,
            anon_key: anon_key.to_string(),
            jwks_url: None,
            jwt_issuer,
            timeout: DEFAULT_AUTH_TIMEOUT,
        })
    }

    /// Load from the environment.
    ///
    /// Returns `None` when the backend is not configured, or configured with
    /// a URL that does not parse. Neither is fatal: the resolver degrades to
    /// pass-through.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`BackendConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let url = non_blank(SUPABASE_URL_ENV)?;
        let anon_key = non_blank(SUPABASE_ANON_KEY_ENV)?;

        let mut config = match Self::new(&url, &anon_key) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "ignoring backend configuration");
                return None;
            }
        };

        if let Some(jwks) = non_blank(SUPABASE_JWKS_URL_ENV) {
            match parse_url(SUPABASE_JWKS_URL_ENV, jwks.trim()) {
                Ok(url) => config.jwks_url = Some(url),
                Err(e) => warn!(error = %e, "local token verification disabled"),
            }
        }
        if let Some(issuer) = non_blank(SUPABASE_JWT_ISSUER_ENV) {
            config.jwt_issuer = issuer.trim().to_string();
        }
        if let Some(ms) = non_blank(AUTH_TIMEOUT_MS_ENV).and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.timeout = Duration::from_millis(ms.max(1));
        }

        Some(config)
    }

    /// `{url}/auth/v1/{path}`
    pub fn auth_endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.url.join(&format!("auth/v1/{path}"))
    }

    /// `{url}/rest/v1/{table}`
    pub fn rest_endpoint(&self, table: &str) -> Result<Url, url::ParseError> {
        self.url.join(&format!("rest/v1/{table}"))
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        name,
        reason: e.to_string(),
    })
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub tls: Option<(PathBuf, PathBuf)>,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = lookup(PORT_ENV)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let addr = format!("{host}:{port}")
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)));

        let tls = match (lookup(TLS_CERT_PATH_ENV), lookup(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some((PathBuf::from(cert), PathBuf::from(key))),
            _ => None,
        };

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            addr,
            tls,
            log_format,
        }
    }
}
