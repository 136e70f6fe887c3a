use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::AppState;

/// Query parameters forwarded to the upstream. Everything else is dropped.
pub const ALLOWED_PARAMS: &[&str] = &[
    "q",
    "searchIn",
    "sources",
    "domains",
    "excludeDomains",
    "from",
    "to",
    "language",
    "sortBy",
    "pageSize",
    "page",
];

const CACHE_CONTROL_VALUE: &str = "public, s-maxage=300, stale-while-revalidate=600";

/// Proxies a search to the upstream "everything" endpoint, injecting the
/// server-held API key and filtering the query through the allowlist.
pub async fn fetch_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let Some(api_key) = state.api_key.as_deref() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "NEWSAPI_KEY environment variable is not set"})),
        )
            .into_response();
    };

    let mut query: Vec<(&str, &str)> = vec![("apiKey", api_key)];
    for (key, value) in &params {
        if ALLOWED_PARAMS.contains(&key.as_str()) {
            query.push((key.as_str(), value.as_str()));
        }
    }

    let url = format!("{}/everything", state.upstream_base);
    let response = match state.client.get(&url).query(&query).send().await {
        Ok(response) => response,
        Err(e) => {
            error!("news upstream request failed: {}", e);
            return internal_error();
        }
    };

    let status = response.status();
    let body = match response.json::<Value>().await {
        Ok(body) => body,
        Err(e) => {
            error!("news upstream returned an unreadable body: {}", e);
            return internal_error();
        }
    };

    if !status.is_success() {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Failed to fetch news data");
        let status =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(json!({"error": message}))).into_response();
    }

    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)],
        Json(body),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
        .into_response()
}
