// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PostgREST-backed profile store.
//!
//! Issues `GET {url}/rest/v1/users?id=eq.{id}&select=*` with the project's
//! anon key and the caller's bearer token, so row level security applies
//! exactly as it does for the web client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use url::Url;

use super::{Profile, ProfileError, ProfileStore};
use crate::config::BackendConfig;

const PROFILE_TABLE: &str = "users";

#[derive(Clone)]
pub struct RestProfileStore {
    endpoint: Url,
    anon_key: String,
    client: reqwest::Client,
}

impl RestProfileStore {
    pub fn new(config: &BackendConfig) -> Result<Self, ProfileError> {
        let endpoint = config
            .rest_endpoint(PROFILE_TABLE)
            .map_err(|e| ProfileError::Unreachable(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout.max(Duration::from_millis(1)))
            .build()
            .map_err(|e| ProfileError::Unreachable(e.to_string()))?;

        Ok(Self {
            endpoint,
            anon_key: config.anon_key.clone(),
            client,
        })
    }

    /// Query URL for a single principal.
    pub fn lookup_url(&self, principal_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{principal_id}"))
            .append_pair("select", "*");
        url
    }
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    async fn get_profile(
        &self,
        principal_id: &str,
        access_token: Option<&str>,
    ) -> Result<Option<Profile>, ProfileError> {
        let bearer = access_token.unwrap_or(&self.anon_key);

        let response = self
            .client
            .get(self.lookup_url(principal_id))
            .header("apikey", &self.anon_key)
            .header(ACCEPT, "application/json")
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| ProfileError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProfileError::Status(response.status().as_u16()));
        }

        let rows: Vec<Profile> = response
            .json()
            .await
            .map_err(|e| ProfileError::Decode(e.to_string()))?;

        Ok(rows.into_iter().find(|row| row.id == principal_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_url_filters_by_id() {
        let config = BackendConfig::new("https://proj.supabase.co", "anon").unwrap();
        let store = RestProfileStore::new(&config).unwrap();
        assert_eq!(
            store.lookup_url("abc-123").as_str(),
            "https://proj.supabase.co/rest/v1/users?id=eq.abc-123&select=*"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_error() {
        let mut config = BackendConfig::new("http://127.0.0.1:9", "anon").unwrap();
        config.timeout = Duration::from_millis(200);
        let store = RestProfileStore::new(&config).unwrap();

        let result = store.get_profile("u1", None).await;
        assert!(matches!(result, Err(ProfileError::Unreachable(_))));
    }
}
