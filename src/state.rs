// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Instant;

use crate::access::AccessResolver;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<AccessResolver>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(resolver: AccessResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
            started_at: Instant::now(),
        }
    }
}

impl Default for AppState {
    /// Unconfigured backend: enforcement disabled.
    fn default() -> Self {
        Self::new(AccessResolver::disabled())
    }
}
