//! Security and hint headers for pages.
//!
//! # Responsibilities
//! - Add `X-XSS-Protection` to pages served on the default route
//! - Announce the site stylesheet with a `Link: rel=preload` hint on HTML pages

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::config::SiteConfig;

pub const X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");

const XSS_BLOCK: &str = "1; mode=block";

/// Preload hint for the (optionally versioned) stylesheet.
pub fn preload_link(stylesheet: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("<{stylesheet}?v={v}>; rel=preload; as=style"),
        None => format!("<{stylesheet}>; rel=preload; as=style"),
    }
}

/// Precomputed page headers.
#[derive(Debug, Clone)]
pub struct PageHeaders {
    preload: Option<HeaderValue>,
}

impl PageHeaders {
    pub fn from_config(site: &SiteConfig) -> Self {
        let link = preload_link(&site.preload_stylesheet, site.asset_version.as_deref());
        let preload = match HeaderValue::from_str(&link) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(link = %link, error = %e, "Preload hint is not a valid header value, disabled");
                None
            }
        };
        Self { preload }
    }

    /// Headers for a page response; the preload hint only goes on HTML.
    pub fn headers(&self, is_html: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_XSS_PROTECTION, HeaderValue::from_static(XSS_BLOCK));
        if is_html {
            if let Some(link) = &self.preload {
                headers.append(header::LINK, link.clone());
            }
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preload_link_format() {
        assert_eq!(
            preload_link("/css/main.css", None),
            "</css/main.css>; rel=preload; as=style"
        );
        assert_eq!(
            preload_link("/css/main.css", Some("abc123")),
            "</css/main.css?v=abc123>; rel=preload; as=style"
        );
    }

    #[test]
    fn test_html_pages_get_preload_hint() {
        let page = PageHeaders::from_config(&SiteConfig::default());

        let html = page.headers(true);
        assert_eq!(html[X_XSS_PROTECTION], "1; mode=block");
        assert_eq!(html[header::LINK], "</css/main.css>; rel=preload; as=style");

        let other = page.headers(false);
        assert_eq!(other[X_XSS_PROTECTION], "1; mode=block");
        assert!(other.get(header::LINK).is_none());
    }
}
