// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Control
//!
//! Every page request passes through the [`AccessResolver`] before it
//! reaches a handler:
//!
//! 1. The path is classified (public, sign-in entry, root, protected)
//! 2. The identity provider resolves the request credential to a principal
//! 3. A fixed policy produces a [`Decision`]: pass through, or redirect to
//!    `/login` or to the caller's role home
//!
//! Pages that render user data additionally use the [`SessionProfile`] /
//! [`AdminProfile`] extractors, which require a profile row.

pub mod decision;
pub mod guard;
pub mod middleware;
pub mod resolver;
pub mod routes;

pub use decision::{Decision, Resolution};
pub use guard::{AdminProfile, GuardRejection, SessionProfile};
pub use middleware::access_middleware;
pub use resolver::{role_for, AccessResolver, BackendStatus, BuildError, ProfileLookupError};
pub use routes::{classify, RouteClass, LOGIN_PATH};
