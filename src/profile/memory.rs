// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process profile store, seeded up front. Used by the router and
//! resolver tests in place of the `users` table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Profile, ProfileError, ProfileStore};

#[derive(Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<HashMap<String, Profile>>>,
}

impl InMemoryProfileStore {
    pub fn with_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        let map = profiles
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect();
        Self {
            profiles: Arc::new(RwLock::new(map)),
        }
    }
}

#[cfg(test)]
impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: Profile) {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile);
    }

    pub async fn remove(&self, principal_id: &str) -> Option<Profile> {
        self.profiles.write().await.remove(principal_id)
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(
        &self,
        principal_id: &str,
        _access_token: Option<&str>,
    ) -> Result<Option<Profile>, ProfileError> {
        Ok(self.profiles.read().await.get(principal_id).cloned())
    }
}
