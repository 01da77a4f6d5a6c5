//! Per-request correlation IDs and the access log.
//!
//! Every game action and word-pool call carries an `x-request-id`. A value
//! sent by the browser client (or a proxy in front of the server) is kept
//! so its logs line up with ours; anything else gets a fresh UUID. The same
//! layer writes the access log and counts requests per route for
//! Prometheus.

use axum::{
    extract::{FromRequestParts, MatchedPath, Request},
    http::{HeaderMap, HeaderValue, StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

use crate::metrics;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied ID we echo back.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation ID of the request being served.
#[derive(Clone, Debug)]
pub struct RequestId(String);

impl RequestId {
    /// Reuses a well-formed inbound ID, otherwise generates one.
    fn from_headers(headers: &HeaderMap) -> Self {
        let inbound = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN);

        match inbound {
            Some(id) => Self(id.to_string()),
            None => Self(Uuid::new_v4().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Tags the request with a [`RequestId`], echoes it on the response, and
/// records one access-log line plus the route-labelled request counter.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(request.headers());
    request.extensions_mut().insert(request_id.clone());

    let started = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    // Unmatched paths share one label.
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let status = response.status();
    tracing::info!(
        request_id = %request_id.as_str(),
        method = %method,
        uri = %uri,
        route = %route,
        status = status.as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request served"
    );
    metrics::http_requests_total(method.as_str(), &route, status.as_u16());

    response
}
