// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tracing::{error, info, warn};

use price_monitor_server::{
    access::AccessResolver,
    api::router,
    config::{BackendConfig, ServerConfig},
    state::AppState,
    telemetry,
};

/// Grace period for in-flight requests on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    let server = ServerConfig::from_env();
    telemetry::init(server.log_format);

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider already installed");
    }

    let backend = BackendConfig::from_env();

    match &backend {
        Some(config) => info!(
            url = %config.url,
            local_jwt_verification = config.jwks_url.is_some(),
            timeout_ms = config.timeout.as_millis() as u64,
            "access enforcement enabled"
        ),
        None => warn!("SUPABASE_URL / SUPABASE_ANON_KEY missing or invalid, every request will pass through"),
    }

    let resolver = match AccessResolver::from_config(backend.as_ref()) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!(error = %e, "failed to build access resolver");
            process::exit(1);
        }
    };

    let app = router(AppState::new(resolver));

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    let result = match &server.tls {
        Some((cert, key)) => {
            let tls = match RustlsConfig::from_pem_file(cert, key).await {
                Ok(tls) => tls,
                Err(e) => {
                    error!(error = %e, cert = %cert.display(), "failed to load TLS credentials");
                    process::exit(1);
                }
            };
            info!(addr = %server.addr, "price monitor access server listening on https (docs at /docs)");
            axum_server::bind_rustls(server.addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            info!(addr = %server.addr, "price monitor access server listening on http (docs at /docs)");
            axum_server::bind(server.addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "server failed");
        process::exit(1);
    }
}

async fn shutdown_signal(handle: Handle<std::net::SocketAddr>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
