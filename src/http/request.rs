//! Request identification.
//!
//! # Responsibilities
//! - Ensure every request carries an `x-request-id` (UUID v4 when absent)
//! - Echo the id on the response so clients and logs correlate
//!
//! # Design Decisions
//! - The id is added as early as possible so every log line of the
//!   aggregation can reference it
//! - An inbound id from the gateway is preserved, never overwritten

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Header carrying the correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Middleware inserting a request id when the gateway did not send one.
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Ok(value) = HeaderValue::from_str(&id) {
        request.headers_mut().insert(X_REQUEST_ID, value.clone());
        let mut response = next.run(request).await;
        response.headers_mut().insert(X_REQUEST_ID, value);
        response
    } else {
        next.run(request).await
    }
}
