//! Book adapter backed by the Open Library search API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use screenlens_shared::Source;

use crate::Provider;
use crate::http::{get_json, non_empty, normalize_base};

const PROVIDER: &str = "openlibrary";

pub struct OpenLibraryProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<BookDoc>,
}

#[derive(Debug, Deserialize)]
struct BookDoc {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    #[serde(default)]
    cover_i: Option<i64>,
    #[serde(default)]
    first_publish_year: Option<i64>,
}

impl OpenLibraryProvider {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: normalize_base(base_url),
            timeout,
        }
    }
}

#[async_trait]
impl Provider for OpenLibraryProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn lookup(&self, query: &str) -> Option<Source> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let url = format!("{}/search.json", self.base_url);
        let body: SearchResponse = get_json(
            &self.client,
            &url,
            &[("title", query), ("limit", "1")],
            self.timeout,
            PROVIDER,
        )
        .await?;

        let doc = body.docs.into_iter().next()?;
        let title = non_empty(doc.title).unwrap_or_else(|| query.to_string());

        let description = (!doc.author_name.is_empty())
            .then(|| format!("Author: {}", doc.author_name.join(", ")));

        let meta = doc.first_publish_year.map(|year| {
            let mut meta = Map::new();
            meta.insert("year".into(), Value::from(year));
            meta
        });

        Some(Source {
            provider: PROVIDER.into(),
            title,
            url: non_empty(doc.key).map(|key| format!("https://openlibrary.org{key}")),
            description,
            image: doc
                .cover_i
                .map(|id| format!("https://covers.openlibrary.org/b/id/{id}-L.jpg")),
            meta,
        })
    }
}
