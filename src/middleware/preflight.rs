//! Preflight status normalisation
//!
//! tower-http's `CorsLayer` answers every `OPTIONS` request itself with
//! `200 OK`. Front-ends were built against a relay that answers preflight with
//! `204 No Content`, so when explicit preflight is enabled this middleware sits
//! outside the CORS layer and rewrites the status. CORS headers are untouched.

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};

/// Rewrite a successful `OPTIONS` response to `204 No Content`
pub async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;

    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }

    response
}
