//! Anonymous session identifiers and the cookie that carries them.
//!
//! Identifiers look like random UUIDs (`xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`)
//! so the collector accepts them as client IDs. Nothing is stored server-side;
//! continuity relies entirely on the client sending the cookie back.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Longest accepted session cookie lifetime.
pub const MAX_COOKIE_AGE_DAYS: i64 = 36_500;

const TEMPLATE: &[u8] = b"xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx";
const HEX: &[u8; 16] = b"0123456789abcdef";

/// Generate a fresh session identifier from the thread-local RNG.
pub fn generate_session_id() -> String {
    generate_with(&mut rand::thread_rng())
}

/// Generate a session identifier from the given random source.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    TEMPLATE
        .iter()
        .map(|&c| match c {
            b'x' => HEX[rng.gen_range(0..16)] as char,
            // variant nibble: 10xx
            b'y' => HEX[8 + rng.gen_range(0..4)] as char,
            other => other as char,
        })
        .collect()
}

/// The session a relay request belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// True when the id was generated for this request and must be set as a cookie.
    pub is_new: bool,
}

impl Session {
    /// Reuse the id from the named cookie, or mint a new one.
    pub fn resolve(headers: &HeaderMap, cookie_name: &str) -> Self {
        match cookie_value(headers, cookie_name) {
            Some(id) => Self { id, is_new: false },
            None => Self {
                id: generate_session_id(),
                is_new: true,
            },
        }
    }

    /// `Set-Cookie` value for this session, expiring `max_age_days` after `now`.
    ///
    /// The lifetime is clamped to `1..=MAX_COOKIE_AGE_DAYS`.
    pub fn set_cookie(&self, cookie_name: &str, now: DateTime<Utc>, max_age_days: i64) -> String {
        let expires = Duration::try_days(max_age_days.clamp(1, MAX_COOKIE_AGE_DAYS))
            .and_then(|age| now.checked_add_signed(age))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        format!(
            "{}={}; Expires={}; Path=/",
            cookie_name,
            self.id,
            expires.format("%a, %d %b %Y %H:%M:%S GMT")
        )
    }
}

/// Find a cookie value across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.to_string())
}
