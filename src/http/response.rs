//! Response construction.
//!
//! # Responsibilities
//! - Build redirect, no-content, forbidden and error responses
//! - Turn a stored asset plus policy headers into a response
//!
//! # Design Decisions
//! - Every response is built from scratch with explicit headers
//! - Fixed bodies for 403 and 500; details only go to the logs

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Response, StatusCode},
};

use crate::assets::Asset;

pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";
pub const FORBIDDEN_BODY: &str = "<h1>403 Forbidden</h1>";

/// Permanent redirect cached for `max_age_secs`.
pub fn redirect(location: &str, max_age_secs: u64) -> Result<Response<Body>, axum::http::Error> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(header::LOCATION, location)
        .header(header::CACHE_CONTROL, format!("max-age={max_age_secs}"))
        .body(Body::empty())
}

/// Empty success, optionally setting a cookie.
pub fn no_content(set_cookie: Option<&str>) -> Result<Response<Body>, axum::http::Error> {
    let mut builder = Response::builder().status(StatusCode::NO_CONTENT);
    if let Some(cookie) = set_cookie {
        builder = builder.header(header::SET_COOKIE, cookie);
    }
    builder.body(Body::empty())
}

/// Refusal of an analytics hit.
pub fn forbidden() -> Response<Body> {
    let mut response = Response::new(Body::from(FORBIDDEN_BODY));
    *response.status_mut() = StatusCode::FORBIDDEN;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

/// Generic failure with a fixed plain-text body.
pub fn internal_error() -> Response<Body> {
    let mut response = Response::new(Body::from(INTERNAL_ERROR_BODY));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Response serving `asset` with `status` and the given extra headers.
pub fn asset_response(
    asset: Asset,
    status: StatusCode,
    extra: HeaderMap,
) -> Result<Response<Body>, axum::http::Error> {
    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, asset.content_type.as_str());
    if let Some(headers) = builder.headers_mut() {
        headers.extend(extra);
    }
    builder.body(Body::from(asset.body))
}
