//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and path prefixes
//! - Compile the analytics allow-list once so bad patterns fail at startup
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::analytics::admission::compile_allow_list;
use crate::analytics::session::MAX_COOKIE_AGE_DAYS;
use crate::config::schema::EdgeConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: String, value: String },

    #[error("{field}: path prefix '{value}' must start with '/'")]
    InvalidPrefix { field: String, value: String },

    #[error("analytics.allow_list: {0}")]
    InvalidAllowList(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("analytics.cookie_max_age_days: {0} is outside 1..={MAX_COOKIE_AGE_DAYS}")]
    CookieLifetime(i64),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if let Some(origin) = &config.site.origin {
        check_url(&mut errors, "site.origin".to_string(), origin);
    }

    let site_prefixes = [
        ("site.legacy_prefix", &config.site.legacy_prefix),
        ("site.index_suffix", &config.site.index_suffix),
        ("site.stylesheet_prefix", &config.site.stylesheet_prefix),
        ("site.preload_stylesheet", &config.site.preload_stylesheet),
        ("assets.not_found_path", &config.assets.not_found_path),
        ("analytics.path_prefix", &config.analytics.path_prefix),
    ];
    for (field, value) in site_prefixes {
        check_prefix(&mut errors, field.to_string(), value);
    }

    check_url(
        &mut errors,
        "analytics.collector_url".to_string(),
        &config.analytics.collector_url,
    );

    if let Err(e) = compile_allow_list(config.analytics.allow_list.as_ref()) {
        errors.push(ValidationError::InvalidAllowList(e.to_string()));
    }

    if !(1..=MAX_COOKIE_AGE_DAYS).contains(&config.analytics.cookie_max_age_days) {
        errors.push(ValidationError::CookieLifetime(
            config.analytics.cookie_max_age_days,
        ));
    }

    for (i, upstream) in config.proxy.upstreams.iter().enumerate() {
        check_prefix(
            &mut errors,
            format!("proxy.upstreams[{i}].path_prefix"),
            &upstream.path_prefix,
        );
        check_url(
            &mut errors,
            format!("proxy.upstreams[{i}].base_url"),
            &upstream.base_url,
        );
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: String, value: &str) {
    if Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_prefix(errors: &mut Vec<ValidationError>, field: String, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::InvalidPrefix {
            field,
            value: value.to_string(),
        });
    }
}
