use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use codeseek_index::{IndexError, SearchQuery};

use super::server::AppState;

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub(crate) async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.search.status().await)
}

pub(crate) async fn search_handler(
    State(state): State<AppState>,
    Json(query): Json<SearchQuery>,
) -> Response {
    match state.search.search(&query).await {
        Ok(result) => Json(result).into_response(),
        Err(e @ IndexError::InvalidQuery(_)) => error_response(StatusCode::BAD_REQUEST, e),
        Err(e) => {
            tracing::error!(error = %e, query = %query.query, "search failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

pub(crate) async fn repositories_handler(State(state): State<AppState>) -> Response {
    match state.search.repositories().await {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to read repository config");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}
