//! Ordered rule table for request classification.
//!
//! # Design Decisions
//! - Rules compiled from config at startup, immutable at runtime
//! - First match wins; anything unmatched is a page
//! - Classification looks at the path only

use serde::Serialize;

use crate::assets::CachePolicy;
use crate::config::EdgeConfig;
use crate::routing::matcher::{ExtensionMatcher, Matcher, PathPrefixMatcher, PathSuffixMatcher};

/// What to do with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "upstream", rename_all = "snake_case")]
pub enum RouteKind {
    /// Forward to the proxy upstream with this index.
    Proxy(usize),
    /// Admit and relay an analytics hit.
    Analytics,
    /// Redirect away from the legacy content prefix.
    LegacyRedirect,
    /// Redirect `…/index.html` to its directory.
    IndexRedirect,
    Stylesheet,
    Font,
    Image,
    /// Everything else.
    Page,
}

impl RouteKind {
    /// Label for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            RouteKind::Proxy(_) => "proxy",
            RouteKind::Analytics => "analytics",
            RouteKind::LegacyRedirect => "legacy_redirect",
            RouteKind::IndexRedirect => "index_redirect",
            RouteKind::Stylesheet => "stylesheet",
            RouteKind::Font => "font",
            RouteKind::Image => "image",
            RouteKind::Page => "page",
        }
    }

    /// Cache policy for routes served from the asset store.
    pub fn cache_policy(&self) -> Option<CachePolicy> {
        match self {
            RouteKind::Stylesheet => Some(CachePolicy::STYLESHEET),
            RouteKind::Font | RouteKind::Image => Some(CachePolicy::MEDIA),
            RouteKind::Page => Some(CachePolicy::DEFAULT),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Rule {
    matcher: Box<dyn Matcher>,
    kind: RouteKind,
}

/// Compiled routing table.
#[derive(Debug)]
pub struct Router {
    rules: Vec<Rule>,
}

impl Router {
    /// Build the rule table in evaluation order.
    pub fn from_config(config: &EdgeConfig) -> Self {
        let mut rules = Vec::new();

        for (i, upstream) in config.proxy.upstreams.iter().enumerate() {
            rules.push(Rule {
                matcher: Box::new(PathPrefixMatcher::new(&upstream.path_prefix)),
                kind: RouteKind::Proxy(i),
            });
        }

        let site = &config.site;
        let ordered: [(Box<dyn Matcher>, RouteKind); 6] = [
            (
                Box::new(PathPrefixMatcher::new(&config.analytics.path_prefix)),
                RouteKind::Analytics,
            ),
            (
                Box::new(PathPrefixMatcher::new(&site.legacy_prefix)),
                RouteKind::LegacyRedirect,
            ),
            (
                Box::new(PathSuffixMatcher::new(&site.index_suffix)),
                RouteKind::IndexRedirect,
            ),
            (
                Box::new(PathPrefixMatcher::new(&site.stylesheet_prefix)),
                RouteKind::Stylesheet,
            ),
            (
                Box::new(ExtensionMatcher::new(&site.font_extensions)),
                RouteKind::Font,
            ),
            (
                Box::new(ExtensionMatcher::new(&site.image_extensions)),
                RouteKind::Image,
            ),
        ];
        rules.extend(ordered.into_iter().map(|(matcher, kind)| Rule { matcher, kind }));

        tracing::debug!(rules = rules.len(), "Routing table compiled");
        Self { rules }
    }

    /// Classify a request path.
    pub fn classify(&self, path: &str) -> RouteKind {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(path))
            .map(|rule| rule.kind)
            .unwrap_or(RouteKind::Page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        Router::from_config(&EdgeConfig::default())
    }

    #[test]
    fn test_rule_order() {
        let r = router();
        assert_eq!(r.classify("/disqus/3.0/threads/list"), RouteKind::Proxy(0));
        assert_eq!(r.classify("/gist/user/abc.js"), RouteKind::Proxy(1));
        assert_eq!(r.classify("/_ga"), RouteKind::Analytics);
        assert_eq!(r.classify("/blog/foo"), RouteKind::LegacyRedirect);
        assert_eq!(r.classify("/page/index.html"), RouteKind::IndexRedirect);
        assert_eq!(r.classify("/index.html"), RouteKind::IndexRedirect);
        assert_eq!(r.classify("/page/notindex.html"), RouteKind::Page);
        assert_eq!(r.classify("/myindex.html"), RouteKind::Page);
        assert_eq!(r.classify("/css/main.css"), RouteKind::Stylesheet);
        assert_eq!(r.classify("/fonts/a.woff2"), RouteKind::Font);
        assert_eq!(r.classify("/img/cat.PNG"), RouteKind::Image);
        assert_eq!(r.classify("/about/"), RouteKind::Page);
        assert_eq!(r.classify("/gallery/"), RouteKind::Page);
        assert_eq!(r.classify("/"), RouteKind::Page);
    }

    #[test]
    fn test_first_match_wins() {
        let r = router();
        // legacy prefix beats the index suffix and image extension
        assert_eq!(r.classify("/blog/index.html"), RouteKind::LegacyRedirect);
        assert_eq!(r.classify("/blog/cat.png"), RouteKind::LegacyRedirect);
        // stylesheet dir beats image extension
        assert_eq!(r.classify("/css/sprite.png"), RouteKind::Stylesheet);
    }

    #[test]
    fn test_cache_policies() {
        assert_eq!(RouteKind::Stylesheet.cache_policy(), Some(CachePolicy::STYLESHEET));
        assert_eq!(RouteKind::Image.cache_policy(), Some(CachePolicy::MEDIA));
        assert_eq!(RouteKind::Page.cache_policy(), Some(CachePolicy::DEFAULT));
        assert_eq!(RouteKind::Analytics.cache_policy(), None);
    }
}
