//! Generic web search over the DuckDuckGo HTML endpoint.
//!
//! The HTML parsing lives entirely in [`parse_top_hit`], so a markup change
//! only touches this file. [`SiteSearch`] adapts a search backend to the
//! [`Provider`] interface, optionally restricted to one domain.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use screenlens_shared::Source;

use crate::Provider;
use crate::http::{get_text, normalize_base};

static RESULT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("valid result selector"));

/// Title and absolute URL of one search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

/// A search backend returning the top result for a query.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Top hit for `query`, restricted to `site` when given.
    async fn top_hit(&self, query: &str, site: Option<&str>) -> Option<SearchHit>;
}

// ---------------------------------------------------------------------------
// DuckDuckGo
// ---------------------------------------------------------------------------

pub struct DuckDuckGo {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl DuckDuckGo {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: normalize_base(base_url),
            timeout,
        }
    }
}

#[async_trait]
impl WebSearch for DuckDuckGo {
    async fn top_hit(&self, query: &str, site: Option<&str>) -> Option<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let q = match site {
            Some(domain) => format!("site:{domain} {query}"),
            None => query.to_string(),
        };
        let url = format!("{}/html/", self.base_url);
        let html = get_text(
            &self.client,
            &url,
            &[("q", q.as_str()), ("kl", "us-en")],
            self.timeout,
            "web",
        )
        .await?;

        let hit = parse_top_hit(&html, &self.base_url);
        if hit.is_none() {
            debug!(query = %q, "no usable search result");
        }
        hit
    }
}

/// First `a.result__a` with a usable http(s) target.
///
/// Relative and protocol-relative hrefs are resolved against `base_url`, and
/// DuckDuckGo redirect links (`/l/?uddg=<target>`) are unwrapped.
pub fn parse_top_hit(html: &str, base_url: &str) -> Option<SearchHit> {
    let doc = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    doc.select(&RESULT_LINK).find_map(|anchor| {
        let href = anchor.value().attr("href")?;
        let url = resolve_href(href, base.as_ref())?;
        let title = anchor
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        Some(SearchHit { title, url })
    })
}

fn resolve_href(href: &str, base: Option<&Url>) -> Option<String> {
    let url = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(href).ok()?,
        Err(_) => return None,
    };

    let target = if url.path().starts_with("/l/") {
        let (_, target) = url.query_pairs().find(|(k, _)| k == "uddg")?;
        Url::parse(&target).ok()?
    } else {
        url
    };

    matches!(target.scheme(), "http" | "https").then(|| target.to_string())
}

// ---------------------------------------------------------------------------
// SiteSearch
// ---------------------------------------------------------------------------

/// Web search exposed as a [`Provider`] under its own label.
pub struct SiteSearch {
    search: Arc<dyn WebSearch>,
    site: Option<String>,
    label: String,
}

impl SiteSearch {
    /// Unscoped search labelled `web`.
    pub fn open(search: Arc<dyn WebSearch>) -> Self {
        Self {
            search,
            site: None,
            label: "web".into(),
        }
    }

    /// Search restricted to `site`, labelled `label`.
    pub fn scoped(search: Arc<dyn WebSearch>, site: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            search,
            site: Some(site.into()),
            label: label.into(),
        }
    }
}

#[async_trait]
impl Provider for SiteSearch {
    fn name(&self) -> &str {
        &self.label
    }

    async fn lookup(&self, query: &str) -> Option<Source> {
        let hit = self.search.top_hit(query, self.site.as_deref()).await?;
        Some(Source::link(&self.label, hit.title, hit.url))
    }
}
