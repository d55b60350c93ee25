//! Music adapter backed by the iTunes Search API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use screenlens_shared::Source;

use crate::Provider;
use crate::http::{get_json, non_empty, normalize_base};

const PROVIDER: &str = "itunes";

pub struct ItunesProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SearchItem {
    kind: Option<String>,
    wrapper_type: Option<String>,
    track_name: Option<String>,
    collection_name: Option<String>,
    artist_name: Option<String>,
    track_view_url: Option<String>,
    collection_view_url: Option<String>,
    artist_view_url: Option<String>,
    primary_genre_name: Option<String>,
    #[serde(rename = "artworkUrl100")]
    artwork_url_100: Option<String>,
    country: Option<String>,
}

impl ItunesProvider {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: normalize_base(base_url),
            timeout,
        }
    }
}

#[async_trait]
impl Provider for ItunesProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn lookup(&self, query: &str) -> Option<Source> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let url = format!("{}/search", self.base_url);
        let body: SearchResponse = get_json(
            &self.client,
            &url,
            &[("term", query), ("limit", "1")],
            self.timeout,
            PROVIDER,
        )
        .await?;

        let item = body.results.into_iter().next()?;

        let title = non_empty(item.track_name)
            .or_else(|| non_empty(item.collection_name))
            .or_else(|| non_empty(item.artist_name))
            .unwrap_or_else(|| query.to_string());
        let url = non_empty(item.track_view_url)
            .or_else(|| non_empty(item.collection_view_url))
            .or_else(|| non_empty(item.artist_view_url));

        let kind = non_empty(item.kind)
            .or_else(|| non_empty(item.wrapper_type))
            .unwrap_or_default();
        let genre = item.primary_genre_name.clone().unwrap_or_default();
        let description = non_empty(Some(format!("{kind} • {genre}")));

        let mut meta = Map::new();
        if let Some(genre) = non_empty(item.primary_genre_name) {
            meta.insert("genre".into(), Value::String(genre));
        }
        if let Some(country) = non_empty(item.country) {
            meta.insert("country".into(), Value::String(country));
        }

        Some(Source {
            provider: PROVIDER.into(),
            title,
            url,
            description,
            image: non_empty(item.artwork_url_100),
            meta: (!meta.is_empty()).then_some(meta),
        })
    }
}
