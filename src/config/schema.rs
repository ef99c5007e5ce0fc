//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Site-level routing settings (redirects, preload hint, cache tiers).
    pub site: SiteConfig,

    /// Static asset store settings.
    pub assets: AssetsConfig,

    /// Analytics relay and admission settings.
    pub analytics: AnalyticsConfig,

    /// Third-party API proxy settings.
    pub proxy: ProxyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Site routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Fixed origin for redirects (e.g., "https://example.com").
    /// When unset the origin is derived from the request.
    pub origin: Option<String>,

    /// Legacy content prefix redirected to the site root.
    pub legacy_prefix: String,

    /// Trailing index segment (e.g. "/index.html") redirected to its directory.
    pub index_suffix: String,

    /// Stylesheet directory prefix.
    pub stylesheet_prefix: String,

    /// Web font extensions (without the dot).
    pub font_extensions: Vec<String>,

    /// Image extensions (without the dot).
    pub image_extensions: Vec<String>,

    /// Stylesheet announced in the preload hint on HTML responses.
    pub preload_stylesheet: String,

    /// Asset version appended to the preload hint as `?v=`.
    pub asset_version: Option<String>,

    /// Cache lifetime of the redirect responses, in seconds.
    pub redirect_max_age_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: None,
            legacy_prefix: "/blog/".to_string(),
            index_suffix: "/index.html".to_string(),
            stylesheet_prefix: "/css/".to_string(),
            font_extensions: ["woff", "woff2", "ttf", "otf", "eot"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            image_extensions: ["png", "jpg", "jpeg", "gif", "svg", "webp", "ico"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preload_stylesheet: "/css/main.css".to_string(),
            asset_version: None,
            redirect_max_age_secs: 3600,
        }
    }
}

/// Static asset store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory holding the built site.
    pub root: String,

    /// Asset served (with status 404) when a lookup fails.
    pub not_found_path: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: "public".to_string(),
            not_found_path: "/404.html".to_string(),
        }
    }
}

/// Referrer host allow-list: absent, a single pattern, or a list of patterns.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AllowList {
    One(String),
    Many(Vec<String>),
}

impl AllowList {
    /// The configured patterns, in order.
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            AllowList::One(p) => vec![p.as_str()],
            AllowList::Many(ps) => ps.iter().map(String::as_str).collect(),
        }
    }
}

/// Analytics relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Inbound path prefix handled by the relay.
    pub path_prefix: String,

    /// Collector endpoint receiving the page-view and timing hits.
    pub collector_url: String,

    /// Optional referrer host allow-list.
    pub allow_list: Option<AllowList>,

    /// Header carrying the client IP as set by the fronting proxy.
    pub client_ip_header: String,

    /// Session cookie name.
    pub cookie_name: String,

    /// Session cookie lifetime in days.
    pub cookie_max_age_days: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            path_prefix: "/_ga".to_string(),
            collector_url: "https://www.google-analytics.com/collect".to_string(),
            allow_list: None,
            client_ip_header: "cf-connecting-ip".to_string(),
            cookie_name: "uuid".to_string(),
            cookie_max_age_days: 30 * 365,
        }
    }
}

/// How an upstream path is derived from the inbound path.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PathRewrite {
    /// Remainder after the prefix is appended to the upstream base path.
    Rebase,
    /// Prefix is removed and the remainder used as-is.
    Strip,
}

/// A single prefix → upstream mapping.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Name used in logs and metrics.
    pub name: String,

    /// Inbound path prefix (e.g., "/disqus/").
    pub path_prefix: String,

    /// Upstream base URL (e.g., "https://disqus.com/api/").
    pub base_url: String,

    /// Path rewriting rule.
    pub rewrite: PathRewrite,
}

/// Third-party API proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Upstream mappings, checked in order.
    pub upstreams: Vec<UpstreamConfig>,

    /// Largest request body forwarded upstream, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            upstreams: vec![
                UpstreamConfig {
                    name: "disqus".to_string(),
                    path_prefix: "/disqus/".to_string(),
                    base_url: "https://disqus.com/api/".to_string(),
                    rewrite: PathRewrite::Rebase,
                },
                UpstreamConfig {
                    name: "gist".to_string(),
                    path_prefix: "/gist/".to_string(),
                    base_url: "https://gist.github.com/".to_string(),
                    rewrite: PathRewrite::Strip,
                },
            ],
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Time allowed for background relay tasks to finish at shutdown.
    pub drain_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            drain_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
