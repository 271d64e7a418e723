// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Price Monitor - Access Server
//!
//! Session and role based route guarding for the price monitoring web
//! application. Field workers record competitor price audits; administrators
//! review and export them. This crate decides which of them may see which
//! page, on top of the managed Supabase backend.
//!
//! ## Modules
//!
//! - `access` - Path classification, access resolver, middleware, page guard
//! - `api` - HTTP API handlers (Axum)
//! - `identity` - Session verification (Supabase auth)
//! - `profile` - Role and sector lookup (Supabase `users` table)

pub mod access;
pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod profile;
pub mod state;
pub mod telemetry;
