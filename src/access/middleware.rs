// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access resolver as Axum middleware.
//!
//! ```rust,ignore
//! let pages = Router::new()
//!     .route("/dashboard", get(dashboard))
//!     .layer(axum::middleware::from_fn_with_state(state.clone(), access_middleware));
//! ```
//!
//! Redirects are `303 See Other`. On pass-through the resolved
//! [`Authenticated`](crate::identity::Authenticated) is stored in the request
//! extensions for extractors downstream. A renewed session is written back
//! as `Set-Cookie` on whichever response goes out.

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::decision::Decision;
use crate::identity::{credential::ACCESS_TOKEN_COOKIE, Credential};
use crate::state::AppState;

pub async fn access_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let credential = Credential::from_headers(request.headers());
    let resolution = state
        .resolver
        .resolve(request.uri().path(), &credential)
        .await;

    let mut response = match &resolution.decision {
        Decision::Redirect { target } => {
            debug!(from = %request.uri().path(), to = %target, "redirecting");
            Redirect::to(target).into_response()
        }
        Decision::PassThrough => {
            if let Some(authenticated) = resolution.authenticated.clone() {
                request.extensions_mut().insert(authenticated);
            }
            next.run(request).await
        }
    };

    if let Some(refresh) = resolution.refresh() {
        // A handler that already wrote the session cookie (sign-out) wins.
        if sets_cookie(response.headers(), ACCESS_TOKEN_COOKIE) {
            debug!("response replaces the session, dropping renewed cookies");
        } else {
            append_set_cookies(response.headers_mut(), refresh.set_cookie_headers());
        }
    }

    response
}

fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers.get_all(SET_COOKIE).iter().any(|value| {
        value
            .to_str()
            .ok()
            .and_then(|cookie| cookie.split_once('='))
            .is_some_and(|(key, _)| key.trim() == name)
    })
}

pub fn append_set_cookies(headers: &mut HeaderMap, cookies: Vec<HeaderValue>) {
    for cookie in cookies {
        headers.append(SET_COOKIE, cookie);
    }
}
