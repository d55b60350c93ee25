//! External knowledge-source adapters.
//!
//! Each adapter turns a query string into at most one normalized [`Source`].
//! Failures of any kind (transport, status, shape, timeout) are absorbed here
//! and come out as `None`; callers never see provider errors.

pub mod http;
pub mod itunes;
pub mod omdb;
pub mod openlibrary;
pub mod web_search;
pub mod wikipedia;

use std::sync::Arc;

use async_trait::async_trait;

use screenlens_shared::{AppConfig, Result, Source, resolve_omdb_key};

pub use http::build_client;
pub use itunes::ItunesProvider;
pub use omdb::OmdbProvider;
pub use openlibrary::OpenLibraryProvider;
pub use web_search::{DuckDuckGo, SearchHit, SiteSearch, WebSearch, parse_top_hit};
pub use wikipedia::WikipediaProvider;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One external knowledge source.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider label, also used as [`Source::provider`].
    fn name(&self) -> &str;

    /// Look up `query`. Blank queries return `None` without a network call.
    async fn lookup(&self, query: &str) -> Option<Source>;
}

// ---------------------------------------------------------------------------
// ProviderSet
// ---------------------------------------------------------------------------

/// The adapters the enrichment orchestrator draws from, one per role.
#[derive(Clone)]
pub struct ProviderSet {
    pub encyclopedia: Arc<dyn Provider>,
    pub movies: Arc<dyn Provider>,
    pub books: Arc<dyn Provider>,
    pub music: Arc<dyn Provider>,
    pub web: Arc<dyn WebSearch>,
}

impl ProviderSet {
    /// Build the production adapters over one shared HTTP client.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = build_client()?;
        let providers = &config.providers;
        let timeout = config.enrichment.provider_timeout();

        Ok(Self {
            encyclopedia: Arc::new(WikipediaProvider::new(
                client.clone(),
                &providers.wikipedia_url,
                timeout,
            )),
            movies: Arc::new(OmdbProvider::new(
                client.clone(),
                &providers.omdb_url,
                resolve_omdb_key(config),
                timeout,
            )),
            books: Arc::new(OpenLibraryProvider::new(
                client.clone(),
                &providers.openlibrary_url,
                timeout,
            )),
            music: Arc::new(ItunesProvider::new(
                client.clone(),
                &providers.itunes_url,
                timeout,
            )),
            web: Arc::new(DuckDuckGo::new(
                client,
                &providers.web_search_url,
                config.enrichment.web_search_timeout(),
            )),
        })
    }

    /// Unscoped web search, labelled `web`.
    pub fn open_web(&self) -> Arc<dyn Provider> {
        Arc::new(SiteSearch::open(self.web.clone()))
    }

    /// Web search restricted to `site`, labelled `label`.
    pub fn site_web(&self, site: &str, label: &str) -> Arc<dyn Provider> {
        Arc::new(SiteSearch::scoped(self.web.clone(), site, label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_labels() {
        let set = ProviderSet::from_config(&AppConfig::default()).unwrap();
        assert_eq!(set.encyclopedia.name(), "wikipedia");
        assert_eq!(set.movies.name(), "omdb");
        assert_eq!(set.books.name(), "openlibrary");
        assert_eq!(set.music.name(), "itunes");
        assert_eq!(set.open_web().name(), "web");
        assert_eq!(set.site_web("www.notino.com", "notino").name(), "notino");
    }
}
