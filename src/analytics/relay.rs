//! Analytics relay: turns one admitted hit into collector requests.
//!
//! Each relay request produces a page-view hit and a timing hit sharing the
//! same session id. They are sent sequentially from a background task; the
//! inbound response never waits on them and their failures are only logged.

use axum::http::StatusCode;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

use crate::analytics::admission::Admitted;
use crate::lifecycle::BackgroundTasks;
use crate::observability::metrics;

/// Page attributes copied from the inbound query into both hits.
pub const PAGE_PARAMS: [&str; 7] = ["dt", "de", "dr", "ul", "sd", "sr", "vp"];

/// Performance timings copied into the timing hit.
pub const TIMING_PARAMS: [&str; 8] = ["plt", "dns", "pdt", "rrt", "tcp", "srt", "dit", "clt"];

/// Cache-busting parameter passed through unchanged.
const CACHE_BUSTER: &str = "z";

/// Kind of collector hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    PageView,
    Timing,
}

impl HitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HitKind::PageView => "pageview",
            HitKind::Timing => "timing",
        }
    }
}

/// A fully built collector request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub kind: HitKind,
    pub url: Url,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("collector request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("collector answered {0}")]
    Status(StatusCode),
}

/// Undo one extra level of percent-encoding, keeping the input if it is not valid UTF-8 afterwards.
fn normalize(value: &str) -> String {
    percent_decode_str(value)
        .decode_utf8()
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

/// Build the page-view and timing hits for an admitted request.
pub fn build_hits(
    collector: &Url,
    admitted: &Admitted,
    session_id: &str,
    client_ip: Option<&str>,
) -> [Hit; 2] {
    let build = |kind: HitKind, extra: &[&str]| {
        let mut url = collector.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("v", "1")
                .append_pair("t", kind.as_str())
                .append_pair("tid", &admitted.tracking_id)
                .append_pair("cid", session_id)
                .append_pair("dl", &admitted.page_url);
            if let Some(ip) = client_ip {
                query.append_pair("uip", ip);
            }
            query.append_pair("ua", &admitted.user_agent);

            for name in PAGE_PARAMS.iter().chain(extra).chain(&[CACHE_BUSTER]) {
                if let Some(value) = admitted.params.get(name) {
                    query.append_pair(name, &normalize(value));
                }
            }
        }
        Hit { kind, url }
    };

    [
        build(HitKind::PageView, &[]),
        build(HitKind::Timing, &TIMING_PARAMS),
    ]
}

/// Sends collector hits on behalf of admitted requests.
#[derive(Debug, Clone)]
pub struct AnalyticsRelay {
    client: reqwest::Client,
    collector: Url,
}

impl AnalyticsRelay {
    pub fn new(client: reqwest::Client, collector: Url) -> Self {
        Self { client, collector }
    }

    /// Build hits and hand them to the background task set.
    pub fn dispatch(
        &self,
        tasks: &BackgroundTasks,
        admitted: &Admitted,
        session_id: &str,
        client_ip: Option<&str>,
    ) {
        let hits = build_hits(&self.collector, admitted, session_id, client_ip);
        let relay = self.clone();
        tasks.spawn(async move {
            relay.send_all(hits).await;
        });
    }

    /// Send hits in order. Failures are logged and otherwise ignored.
    pub async fn send_all(&self, hits: impl IntoIterator<Item = Hit>) {
        for hit in hits {
            let kind = hit.kind;
            match self.send(hit).await {
                Ok(()) => {
                    metrics::record_relay(kind.as_str(), "ok");
                    tracing::debug!(kind = kind.as_str(), "Analytics hit relayed");
                }
                Err(e) => {
                    metrics::record_relay(kind.as_str(), "error");
                    tracing::warn!(kind = kind.as_str(), error = %e, "Analytics hit failed");
                }
            }
        }
    }

    async fn send(&self, hit: Hit) -> Result<(), RelayError> {
        let response = self.client.get(hit.url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RelayError::Status(status))
        }
    }
}
