//! Cache policies and the headers that express them.
//!
//! A policy carries an edge TTL (for the CDN in front of us, sent as
//! `CDN-Cache-Control`) and a browser TTL (sent as `Cache-Control`).

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

pub const CDN_CACHE_CONTROL: HeaderName = HeaderName::from_static("cdn-cache-control");

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

/// Cache lifetimes chosen for one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub edge_ttl: Duration,
    pub browser_ttl: Duration,
    /// Let the edge cache the response even when it is not a success.
    pub cache_everything: bool,
    /// Replace `Cache-Control` with `public, max-age=<browser>, immutable`.
    pub immutable: bool,
}

impl CachePolicy {
    /// Fingerprinted stylesheets: one year everywhere.
    pub const STYLESHEET: CachePolicy = CachePolicy {
        edge_ttl: Duration::from_secs(365 * DAY),
        browser_ttl: Duration::from_secs(365 * DAY),
        cache_everything: true,
        immutable: true,
    };

    /// Fonts and images: thirty days everywhere.
    pub const MEDIA: CachePolicy = CachePolicy {
        edge_ttl: Duration::from_secs(30 * DAY),
        browser_ttl: Duration::from_secs(30 * DAY),
        cache_everything: true,
        immutable: true,
    };

    /// Pages and everything else: four hours at the edge, one hour in the browser.
    pub const DEFAULT: CachePolicy = CachePolicy {
        edge_ttl: Duration::from_secs(4 * HOUR),
        browser_ttl: Duration::from_secs(HOUR),
        cache_everything: false,
        immutable: false,
    };

    /// `Cache-Control` value for browsers.
    pub fn browser_header(&self) -> String {
        let secs = self.browser_ttl.as_secs();
        if self.immutable {
            format!("public, max-age={secs}, immutable")
        } else {
            format!("max-age={secs}")
        }
    }

    /// `CDN-Cache-Control` value for the edge.
    pub fn edge_header(&self) -> String {
        format!("public, max-age={}", self.edge_ttl.as_secs())
    }

    /// Headers this policy adds to a response with the given success flag.
    pub fn headers(&self, success: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(v) = HeaderValue::from_str(&self.browser_header()) {
            headers.insert(header::CACHE_CONTROL, v);
        }
        if success || self.cache_everything {
            if let Ok(v) = HeaderValue::from_str(&self.edge_header()) {
                headers.insert(CDN_CACHE_CONTROL, v);
            }
        }
        headers
    }
}
