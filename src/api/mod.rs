// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware::from_fn_with_state, routing::get, routing::post, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    access::{access_middleware, Decision, RouteClass},
    profile::{Role, Sector},
    state::AppState,
};

pub mod access;
pub mod health;
pub mod session;

pub fn router(state: AppState) -> Router {
    // Not part of the page surface; never redirected.
    let service_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/v1/access/resolve", post(access::resolve_access))
        .with_state(state.clone());

    let page_routes = Router::new()
        .route("/v1/session", get(session::current_session))
        .route("/dashboard", get(session::dashboard))
        .route("/admin", get(session::admin))
        .fallback(session::not_found)
        .layer(from_fn_with_state(state.clone(), access_middleware))
        .with_state(state);

    Router::new()
        .merge(service_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(page_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        access::resolve_access,
        session::current_session,
        session::dashboard,
        session::admin
    ),
    components(
        schemas(
            Decision,
            RouteClass,
            Role,
            Sector,
            access::ResolveRequest,
            access::ResolveResponse,
            session::SessionResponse,
            session::HomeView,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Access", description = "Route access decisions"),
        (name = "Session", description = "Signed-in user and role homes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessResolver;
    use crate::identity::{
        Authenticated, Credential, CredentialRefresh, IdentityError, IdentityProvider, Principal,
    };
    use crate::profile::{InMemoryProfileStore, Profile};
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{LOCATION, SET_COOKIE},
            Request, StatusCode,
        },
        response::Response,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    /// The access token is the user id. A refresh token `renew-<id>` renews
    /// the session of `<id>`.
    struct TokenIsUserId;

    #[async_trait]
    impl IdentityProvider for TokenIsUserId {
        async fn current_principal(
            &self,
            credential: &Credential,
        ) -> Result<Option<Authenticated>, IdentityError> {
            if let Some(id) = credential
                .refresh_token()
                .and_then(|r| r.strip_prefix("renew-"))
                .filter(|_| credential.access_token().is_none())
            {
                return Ok(Some(Authenticated {
                    principal: Principal::new(id),
                    access_token: id.to_string(),
                    refresh: Some(CredentialRefresh {
                        access_token: id.to_string(),
                        refresh_token: format!("renew-{id}-2"),
                        expires_in: 3600,
                    }),
                }));
            }

            Ok(credential.access_token().map(|t| {
                let principal = match t {
                    "hinted" => Principal::new(t).with_role_hint("admin"),
                    _ => Principal::new(t),
                };
                Authenticated::new(principal, t)
            }))
        }

        async fn sign_out(&self, _credential: &Credential) -> Result<(), IdentityError> {
            Ok(())
        }
    }

    fn enforcing_app() -> Router {
        let profiles = InMemoryProfileStore::with_profiles([
            Profile::new("admin-1", Role::Admin).with_sector(Sector::Central),
            Profile::new("worker-1", Role::FieldWorker).with_sector(Sector::Ensul),
        ]);
        router(AppState::new(AccessResolver::new(
            Arc::new(TokenIsUserId),
            Arc::new(profiles),
        )))
    }

    async fn send(app: Router, method: &str, uri: &str, token: Option<&str>, body: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("cookie", format!("sb-access-token={token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        app.oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::default());
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn anonymous_admin_products_redirects_to_login() {
        let response = send(enforcing_app(), "GET", "/admin/products", None, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/login");
    }

    #[tokio::test]
    async fn field_worker_on_login_goes_to_dashboard() {
        let response = send(enforcing_app(), "GET", "/login", Some("worker-1"), None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/dashboard");
    }

    #[tokio::test]
    async fn health_is_never_redirected() {
        let response = send(enforcing_app(), "GET", "/health/live", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn dashboard_renders_for_field_worker() {
        let response = send(enforcing_app(), "GET", "/dashboard", Some("worker-1"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["view"], "dashboard");
        assert_eq!(body["session"]["role"], "field_worker");
        assert_eq!(body["session"]["sector"], "Ensul");
    }

    #[tokio::test]
    async fn admin_page_sends_field_worker_home() {
        let response = send(enforcing_app(), "GET", "/admin", Some("worker-1"), None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/dashboard");

        let response = send(enforcing_app(), "GET", "/admin", Some("admin-1"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["view"], "admin");
    }

    #[tokio::test]
    async fn dashboard_without_profile_row_signs_out() {
        // Routing lets the principal through; the profile checkpoint does not.
        let response = send(enforcing_app(), "GET", "/dashboard", Some("ghost"), None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/login");
        assert!(response.headers().contains_key("set-cookie"));
    }

    #[tokio::test]
    async fn renewed_session_without_profile_row_stays_signed_out() {
        let request = Request::builder()
            .uri("/dashboard")
            .header("cookie", "sb-refresh-token=renew-ghost")
            .body(Body::empty())
            .unwrap();
        let response = enforcing_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/login");
        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")), "{cookies:?}");
    }

    #[tokio::test]
    async fn renewed_session_with_profile_row_sets_cookies() {
        let request = Request::builder()
            .uri("/dashboard")
            .header("cookie", "sb-refresh-token=renew-worker-1")
            .body(Body::empty())
            .unwrap();
        let response = enforcing_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let first = response.headers().get_all(SET_COOKIE).iter().next().unwrap();
        assert!(first.to_str().unwrap().starts_with("sb-access-token=worker-1"));
    }

    #[tokio::test]
    async fn session_endpoint_reports_profile() {
        let response = send(enforcing_app(), "GET", "/v1/session", Some("admin-1"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["user_id"], "admin-1");
        assert_eq!(body["home"], "/admin");
    }

    #[tokio::test]
    async fn unknown_page_passes_through_to_not_found() {
        let response = send(enforcing_app(), "GET", "/audit/new", Some("worker-1"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn resolve_endpoint_returns_decisions() {
        let response = send(
            enforcing_app(),
            "POST",
            "/v1/access/resolve",
            None,
            Some(r#"{"path": "/admin/products"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["decision"]["action"], "redirect");
        assert_eq!(body["decision"]["target"], "/login");
        assert_eq!(body["class"], "protected");
        assert_eq!(body["authenticated"], false);

        let response = send(
            enforcing_app(),
            "POST",
            "/v1/access/resolve",
            Some("hinted"),
            Some(r#"{"path": "/"}"#),
        )
        .await;
        let body = json(response).await;
        assert_eq!(body["decision"]["target"], "/admin");
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn resolve_endpoint_rejects_relative_paths() {
        let response = send(
            enforcing_app(),
            "POST",
            "/v1/access/resolve",
            None,
            Some(r#"{"path": "admin"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unconfigured_backend_passes_everything_through() {
        let app = router(AppState::default());
        let response = send(app.clone(), "GET", "/admin/products", None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            app,
            "POST",
            "/v1/access/resolve",
            None,
            Some(r#"{"path": "/admin"}"#),
        )
        .await;
        assert_eq!(json(response).await["decision"]["action"], "pass_through");
    }
}
