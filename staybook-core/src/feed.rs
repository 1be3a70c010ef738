//! Fetching external iCal feeds.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use url::{Host, Url};

use crate::error::{StaybookError, StaybookResult};

/// Source of raw iCal text for a feed URL.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> StaybookResult<String>;
}

/// Parse a feed URL, rewriting `webcal://` to `https://`.
///
/// Loopback, private and link-local hosts are refused so a feed URL can't
/// reach services next to the server. Names are not resolved here.
pub fn normalize_feed_url(raw: &str) -> StaybookResult<Url> {
    let raw = raw.trim();
    let rewritten = match raw.get(..9) {
        Some(scheme) if scheme.eq_ignore_ascii_case("webcal://") => {
            format!("https://{}", &raw[9..])
        }
        _ => raw.to_string(),
    };

    let url = Url::parse(&rewritten)
        .map_err(|e| StaybookError::Validation(format!("invalid feed URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(StaybookError::Validation(format!(
            "unsupported feed URL scheme '{}' in '{raw}'",
            url.scheme()
        )));
    }
    if url.host().is_none_or(|host| is_internal_host(&host)) {
        return Err(StaybookError::Validation(format!(
            "feed URL '{raw}' points at a local or private address"
        )));
    }
    Ok(url)
}

fn is_internal_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(name) => {
            let name = name.trim_end_matches('.').to_ascii_lowercase();
            name == "localhost" || name.ends_with(".localhost")
        }
        Host::Ipv4(ip) => is_internal_v4(ip),
        Host::Ipv6(ip) => match ip.to_ipv4_mapped() {
            Some(v4) => is_internal_v4(&v4),
            None => is_internal_v6(ip),
        },
    }
}

fn is_internal_v4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
}

fn is_internal_v6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    // fc00::/7 unique local, fe80::/10 link-local
    ip.is_loopback() || ip.is_unspecified() || first & 0xfe00 == 0xfc00 || first & 0xffc0 == 0xfe80
}

pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> StaybookResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("staybook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StaybookError::Feed(format!("failed to build HTTP client: {e}")))?;
        Ok(HttpFeedFetcher { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> StaybookResult<String> {
        let target = normalize_feed_url(url)?;
        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| StaybookError::Feed(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StaybookError::Feed(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| StaybookError::Feed(format!("{url}: {e}")))
    }
}

/// In-memory feeds keyed by URL, for tests and offline runs. Unknown URLs fail.
#[derive(Default)]
pub struct StaticFeeds {
    feeds: Mutex<HashMap<String, Result<String, String>>>,
}

impl StaticFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, url: &str, body: &str) {
        self.insert(url, Ok(body.to_string()));
    }

    /// Make `url` fail with `message` on the next fetches.
    pub fn fail(&self, url: &str, message: &str) {
        self.insert(url, Err(message.to_string()));
    }

    fn insert(&self, url: &str, entry: Result<String, String>) {
        if let Ok(mut feeds) = self.feeds.lock() {
            feeds.insert(url.to_string(), entry);
        }
    }
}

#[async_trait]
impl FeedFetcher for StaticFeeds {
    async fn fetch(&self, url: &str) -> StaybookResult<String> {
        let feeds = self
            .feeds
            .lock()
            .map_err(|_| StaybookError::Feed("feed table poisoned".into()))?;
        match feeds.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(message)) => Err(StaybookError::Feed(format!("{url}: {message}"))),
            None => Err(StaybookError::Feed(format!("{url}: no such feed"))),
        }
    }
}
