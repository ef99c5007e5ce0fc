//! Admission control for the analytics relay.
//!
//! # Responsibilities
//! - Reject hits without a parseable referrer, a user agent, or a `ga=UA-…` tracking id
//! - Optionally restrict referrer hosts to a configured allow-list
//!
//! # Design Decisions
//! - The allow-list is compiled once, at construction, into one alternation pattern
//! - Host matching is an unanchored regex search (`a.com` also matches `xa.com.evil.org`)
//! - Blocked requests carry a reason for logs and metrics; the client only sees 403

use regex::Regex;
use url::{form_urlencoded, Url};

use crate::config::AllowList;

/// Query parameter carrying the tracking id.
pub const TRACKING_PARAM: &str = "ga";
const TRACKING_PREFIX: &str = "UA-";

/// Why a relay request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    MissingReferrer,
    InvalidReferrer,
    MissingUserAgent,
    MissingTrackingId,
    HostNotAllowed,
}

impl BlockReason {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::MissingReferrer => "missing_referrer",
            BlockReason::InvalidReferrer => "invalid_referrer",
            BlockReason::MissingUserAgent => "missing_user_agent",
            BlockReason::MissingTrackingId => "missing_tracking_id",
            BlockReason::HostNotAllowed => "host_not_allowed",
        }
    }
}

/// Decoded query string of a relay request, in original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self(pairs)
    }

    /// First value for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Everything the relay needs from a request that passed admission.
#[derive(Debug, Clone)]
pub struct Admitted {
    /// Referer header exactly as received; relayed as the page URL.
    pub page_url: String,
    /// Parsed referrer, used for the host check.
    pub referrer: Url,
    pub user_agent: String,
    pub tracking_id: String,
    pub params: QueryParams,
}

/// Outcome of an admission check.
#[derive(Debug, Clone)]
pub enum Admission {
    Allow(Admitted),
    Block(BlockReason),
}

/// Compile the allow-list patterns into a single alternation.
///
/// An absent or empty allow-list yields `None` (every host allowed).
pub fn compile_allow_list(allow_list: Option<&AllowList>) -> Result<Option<Regex>, regex::Error> {
    let patterns: Vec<&str> = allow_list
        .map(|a| a.patterns())
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();

    if patterns.is_empty() {
        return Ok(None);
    }
    Regex::new(&patterns.join("|")).map(Some)
}

/// Decides whether an inbound relay request is a legitimate page hit.
#[derive(Debug, Clone, Default)]
pub struct AdmissionFilter {
    allow_list: Option<Regex>,
}

impl AdmissionFilter {
    /// Build a filter from the configured allow-list.
    pub fn new(allow_list: Option<&AllowList>) -> Result<Self, regex::Error> {
        Ok(Self {
            allow_list: compile_allow_list(allow_list)?,
        })
    }

    /// True when an allow-list is in force.
    pub fn is_restricted(&self) -> bool {
        self.allow_list.is_some()
    }

    /// Evaluate the referrer, user agent and raw query string of a request.
    pub fn check(
        &self,
        referer: Option<&str>,
        user_agent: Option<&str>,
        query: Option<&str>,
    ) -> Admission {
        let Some(page_url) = referer else {
            return Admission::Block(BlockReason::MissingReferrer);
        };
        let Ok(referrer) = Url::parse(page_url) else {
            return Admission::Block(BlockReason::InvalidReferrer);
        };

        let Some(user_agent) = user_agent else {
            return Admission::Block(BlockReason::MissingUserAgent);
        };

        let params = QueryParams::parse(query);
        let tracking_id = match params.get(TRACKING_PARAM) {
            Some(id) if id.starts_with(TRACKING_PREFIX) => id.to_string(),
            _ => return Admission::Block(BlockReason::MissingTrackingId),
        };

        if let Some(allowed) = &self.allow_list {
            if !allowed.is_match(referrer.host_str().unwrap_or("")) {
                return Admission::Block(BlockReason::HostNotAllowed);
            }
        }

        Admission::Allow(Admitted {
            page_url: page_url.to_string(),
            referrer,
            user_agent: user_agent.to_string(),
            tracking_id,
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERER: Option<&str> = Some("https://example.com");
    const UA: Option<&str> = Some("UA");
    const QUERY: Option<&str> = Some("ga=UA-12345");

    fn blocked(admission: Admission) -> Option<BlockReason> {
        match admission {
            Admission::Allow(_) => None,
            Admission::Block(reason) => Some(reason),
        }
    }

    #[test]
    fn test_allows_complete_request_without_allow_list() {
        let filter = AdmissionFilter::new(None).unwrap();
        match filter.check(REFERER, UA, QUERY) {
            Admission::Allow(admitted) => {
                assert_eq!(admitted.tracking_id, "UA-12345");
                assert_eq!(admitted.user_agent, "UA");
                assert_eq!(admitted.referrer.host_str(), Some("example.com"));
                assert_eq!(admitted.page_url, "https://example.com");
            }
            Admission::Block(reason) => panic!("unexpected block: {reason:?}"),
        }
    }

    #[test]
    fn test_blocks_referrer_outside_allow_list() {
        let allow = AllowList::Many(vec!["other\\.com".into()]);
        let filter = AdmissionFilter::new(Some(&allow)).unwrap();
        assert_eq!(
            blocked(filter.check(REFERER, UA, QUERY)),
            Some(BlockReason::HostNotAllowed)
        );
    }

    #[test]
    fn test_allows_referrer_inside_allow_list() {
        let allow = AllowList::One("example\\.com".into());
        let filter = AdmissionFilter::new(Some(&allow)).unwrap();
        assert!(filter.is_restricted());
        assert_eq!(blocked(filter.check(REFERER, UA, QUERY)), None);
    }

    #[test]
    fn test_allow_list_match_is_unanchored() {
        let allow = AllowList::One("example.com".into());
        let filter = AdmissionFilter::new(Some(&allow)).unwrap();
        assert_eq!(
            blocked(filter.check(Some("https://notexample.com.evil.org/"), UA, QUERY)),
            None
        );
    }

    #[test]
    fn test_blocks_missing_referrer_regardless_of_other_fields() {
        let filter = AdmissionFilter::new(None).unwrap();
        assert_eq!(
            blocked(filter.check(None, UA, QUERY)),
            Some(BlockReason::MissingReferrer)
        );
    }

    #[test]
    fn test_blocks_unparseable_referrer() {
        let filter = AdmissionFilter::new(None).unwrap();
        assert_eq!(
            blocked(filter.check(Some("not a url"), UA, QUERY)),
            Some(BlockReason::InvalidReferrer)
        );
    }

    #[test]
    fn test_blocks_missing_user_agent() {
        let filter = AdmissionFilter::new(None).unwrap();
        assert_eq!(
            blocked(filter.check(REFERER, None, QUERY)),
            Some(BlockReason::MissingUserAgent)
        );
    }

    #[test]
    fn test_blocks_bad_tracking_id() {
        let filter = AdmissionFilter::new(None).unwrap();
        for query in [None, Some(""), Some("ga=G-123"), Some("x=UA-1")] {
            assert_eq!(
                blocked(filter.check(REFERER, UA, query)),
                Some(BlockReason::MissingTrackingId),
                "query {query:?}"
            );
        }
    }

    #[test]
    fn test_empty_allow_list_is_unrestricted() {
        let allow = AllowList::Many(vec![]);
        let filter = AdmissionFilter::new(Some(&allow)).unwrap();
        assert!(!filter.is_restricted());
    }

    #[test]
    fn test_query_params_decode_once() {
        let params = QueryParams::parse(Some("dt=Hello%20World&dt=second&dr=a%2520b"));
        assert_eq!(params.get("dt"), Some("Hello World"));
        assert_eq!(params.get("dr"), Some("a%20b"));
        assert_eq!(params.get("missing"), None);
    }
}
