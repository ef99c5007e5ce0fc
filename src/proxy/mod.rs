//! Third-party API proxy.
//!
//! # Responsibilities
//! - Rewrite prefix-matched requests onto their upstream host and path
//! - Forward method, body and a fixed safe subset of request headers
//! - Return the upstream response with permissive CORS headers
//!
//! # Design Decisions
//! - No retries; upstream failures surface as `ProxyError`
//! - Hop-by-hop headers from the upstream are not copied back
//! - The outbound request and the returned response are built fresh; nothing
//!   from the inbound header map is mutated

pub mod upstream;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response},
};
use thiserror::Error;

use crate::config::ProxyConfig;
pub use upstream::Upstream;

/// Request headers always forwarded when present.
const FORWARDED_HEADERS: [HeaderName; 8] = [
    header::USER_AGENT,
    header::ACCEPT,
    header::ACCEPT_LANGUAGE,
    header::ACCEPT_ENCODING,
    header::CONNECTION,
    header::CACHE_CONTROL,
    header::REFERER,
    header::ORIGIN,
];

/// Response headers that describe the upstream connection, not the payload.
const HOP_BY_HOP: [HeaderName; 6] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
    header::PROXY_AUTHENTICATE,
];

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("no upstream configured at index {0}")]
    UnknownUpstream(usize),

    #[error("path '{0}' does not belong to upstream '{1}'")]
    PathMismatch(String, String),

    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

/// Forwards requests to the configured API upstreams.
#[derive(Debug, Clone)]
pub struct ApiProxy {
    client: reqwest::Client,
    upstreams: Vec<Upstream>,
    max_body_bytes: usize,
}

impl ApiProxy {
    pub fn new(client: reqwest::Client, config: &ProxyConfig) -> Result<Self, url::ParseError> {
        let upstreams = config
            .upstreams
            .iter()
            .map(Upstream::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            client,
            upstreams,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Forward `request` to the upstream at `index`.
    pub async fn forward(
        &self,
        index: usize,
        request: Request<Body>,
    ) -> Result<Response<Body>, ProxyError> {
        let upstream = self
            .upstreams
            .get(index)
            .ok_or(ProxyError::UnknownUpstream(index))?;

        let (parts, body) = request.into_parts();
        let target = upstream
            .target(parts.uri.path(), parts.uri.query())
            .ok_or_else(|| {
                ProxyError::PathMismatch(parts.uri.path().to_string(), upstream.name.clone())
            })?;
        let body = axum::body::to_bytes(body, self.max_body_bytes).await?;

        tracing::debug!(
            upstream = %upstream.name,
            method = %parts.method,
            target = %target,
            "Forwarding to upstream"
        );

        let response = self
            .client
            .request(parts.method, target)
            .headers(forwarded_headers(&parts.headers))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let headers = response_headers(response.headers());
        let bytes = response.bytes().await?;

        let mut builder = Response::builder().status(status);
        if let Some(h) = builder.headers_mut() {
            h.extend(headers);
        }
        Ok(builder.body(Body::from(bytes))?)
    }
}

/// The safe subset of inbound headers sent upstream.
pub fn forwarded_headers(inbound: &HeaderMap) -> HeaderMap {
    FORWARDED_HEADERS
        .iter()
        .filter_map(|name| inbound.get(name).map(|v| (name.clone(), v.clone())))
        .collect()
}

/// Upstream response headers minus hop-by-hop ones, with CORS opened up.
pub fn response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers: HeaderMap = upstream
        .iter()
        .filter(|(name, _)| !HOP_BY_HOP.contains(*name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, HEAD, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_safe_headers_are_forwarded() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::USER_AGENT, HeaderValue::from_static("test"));
        inbound.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        inbound.insert(header::COOKIE, HeaderValue::from_static("uuid=secret"));
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer x"));
        inbound.insert(header::HOST, HeaderValue::from_static("blog.example.com"));

        let out = forwarded_headers(&inbound);
        assert_eq!(out.len(), 2);
        assert_eq!(out[header::USER_AGENT], "test");
        assert!(out.get(header::COOKIE).is_none());
        assert!(out.get(header::HOST).is_none());
        assert!(out.get(header::REFERER).is_none());
    }

    #[test]
    fn test_referer_and_origin_forwarded_when_present() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::REFERER, HeaderValue::from_static("https://blog.example.com/a"));
        inbound.insert(header::ORIGIN, HeaderValue::from_static("https://blog.example.com"));

        let out = forwarded_headers(&inbound);
        assert_eq!(out[header::REFERER], "https://blog.example.com/a");
        assert_eq!(out[header::ORIGIN], "https://blog.example.com");
    }

    #[test]
    fn test_cors_overrides_upstream_values() {
        let mut upstream = HeaderMap::new();
        upstream.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("https://disqus.com"),
        );
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));

        let out = response_headers(&upstream);
        assert_eq!(out[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(out[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, HEAD, POST, OPTIONS");
        assert_eq!(out[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
        assert_eq!(out[header::CONTENT_TYPE], "application/json");
        assert!(out.get(header::TRANSFER_ENCODING).is_none());
    }
}
