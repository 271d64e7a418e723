// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decision endpoint for edge proxies.
//!
//! A proxy that serves the pages itself forwards the client's cookies and the
//! requested path, then acts on the returned decision.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    access::{classify, middleware::append_set_cookies, Decision, RouteClass},
    error::ApiError,
    identity::Credential,
    profile::Role,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveRequest {
    /// Requested page path, e.g. `/admin/products`.
    pub path: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResolveResponse {
    pub decision: Decision,
    pub class: RouteClass,
    /// Whether a principal was resolved from the forwarded credential.
    pub authenticated: bool,
    /// Present when the decision depended on the caller's role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Resolve the access decision for a path.
///
/// The credential is read from the request's own cookies or bearer header.
/// A renewed session comes back as `Set-Cookie`.
#[utoipa::path(
    post,
    path = "/v1/access/resolve",
    tag = "Access",
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Access decision", body = ResolveResponse),
        (status = 400, description = "Path is not absolute"),
    )
)]
pub async fn resolve_access(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ResolveRequest>,
) -> Result<Response, ApiError> {
    if !request.path.starts_with('/') {
        return Err(ApiError::bad_request("path must start with '/'"));
    }

    let credential = Credential::from_headers(&headers);
    let resolution = state.resolver.resolve(&request.path, &credential).await;

    let body = ResolveResponse {
        class: classify(&request.path),
        authenticated: resolution.authenticated.is_some(),
        role: resolution.role,
        decision: resolution.decision.clone(),
    };

    let mut response = Json(body).into_response();
    if let Some(refresh) = resolution.refresh() {
        append_set_cookies(response.headers_mut(), refresh.set_cookie_headers());
    }

    Ok(response)
}
