//! Upstream targets and path rewriting.

use url::Url;

use crate::config::{PathRewrite, UpstreamConfig};

/// A compiled prefix → upstream mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub name: String,
    pub prefix: String,
    pub base: Url,
    pub rewrite: PathRewrite,
}

impl Upstream {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            name: config.name.clone(),
            prefix: config.path_prefix.clone(),
            base: Url::parse(&config.base_url)?,
            rewrite: config.rewrite,
        })
    }

    /// Upstream URL for an inbound path and raw query.
    ///
    /// Returns `None` when the path does not carry this upstream's prefix.
    pub fn target(&self, path: &str, query: Option<&str>) -> Option<Url> {
        let rest = path.strip_prefix(&self.prefix)?.trim_start_matches('/');

        let mut url = self.base.clone();
        let new_path = match self.rewrite {
            PathRewrite::Rebase => {
                let base_path = self.base.path();
                if base_path.ends_with('/') {
                    format!("{base_path}{rest}")
                } else {
                    format!("{base_path}/{rest}")
                }
            }
            PathRewrite::Strip => format!("/{rest}"),
        };
        url.set_path(&new_path);
        url.set_query(query);
        Some(url)
    }
}
