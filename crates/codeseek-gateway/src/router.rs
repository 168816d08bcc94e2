use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use subtle::ConstantTimeEq;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, repositories_handler, search_handler, status_handler};
use super::server::AppState;

#[derive(Clone)]
struct AuthConfig {
    token: Option<String>,
}

pub(crate) fn build_router(
    state: AppState,
    auth_token: Option<String>,
    max_body_size: usize,
) -> Router {
    let auth_cfg = AuthConfig { token: auth_token };

    let protected = Router::new()
        .route("/search", post(search_handler))
        .route("/status", get(status_handler))
        .route("/repositories", get(repositories_handler))
        .layer(middleware::from_fn_with_state(auth_cfg, auth_middleware))
        .layer(RequestBodyLimitLayer::new(max_body_size));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn auth_middleware(
    axum::extract::State(cfg): axum::extract::State<AuthConfig>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(ref expected) = cfg.token {
        let token = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or("");

        // Fixed-length digests so the comparison does not leak the token length.
        let token_hash = blake3::hash(token.as_bytes());
        let expected_hash = blake3::hash(expected.as_bytes());
        if !bool::from(token_hash.as_bytes().ct_eq(expected_hash.as_bytes())) {
            tracing::debug!(path = %req.uri().path(), "rejected unauthenticated request");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    next.run(req).await
}
