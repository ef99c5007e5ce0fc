//! Request inspection helpers.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4) for the request-id layers
//! - Resolve the client IP behind the fronting proxy
//! - Resolve the public origin used in redirects
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Nothing here mutates the inbound request

use std::net::SocketAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Makes a fresh UUID v4 request ID for every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID set by the request-id layer, or "unknown".
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Client IP: the trusted proxy header, else the socket peer.
///
/// `X-Forwarded-For` is client-controlled and never consulted.
pub fn client_ip(headers: &HeaderMap, trusted_header: &str, peer: Option<SocketAddr>) -> Option<String> {
    header_str(headers, trusted_header)
        .map(str::to_string)
        .or_else(|| peer.map(|p| p.ip().to_string()))
}

/// Public origin (`scheme://host`) for absolute redirect locations.
///
/// A configured origin wins; otherwise `X-Forwarded-Proto` (default `https`)
/// and `Host` are used. Without a `Host` header the origin is empty and the
/// location stays relative.
pub fn request_origin(headers: &HeaderMap, configured: Option<&str>) -> String {
    if let Some(origin) = configured {
        return origin.trim_end_matches('/').to_string();
    }

    let Some(host) = headers.get(header::HOST).and_then(|v| v.to_str().ok()) else {
        return String::new();
    };
    let scheme = header_str(headers, X_FORWARDED_PROTO)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .unwrap_or("https");
    format!("{scheme}://{host}")
}
