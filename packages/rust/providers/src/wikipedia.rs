//! Encyclopedia adapter: title search, then the page summary of the best match.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use screenlens_shared::Source;

use crate::Provider;
use crate::http::{get_json, non_empty, normalize_base};

const PROVIDER: &str = "wikipedia";

pub struct WikipediaProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    pages: Vec<SearchPage>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    lang: Option<String>,
    #[serde(default)]
    thumbnail: Option<Thumbnail>,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<DesktopUrls>,
}

#[derive(Debug, Deserialize)]
struct DesktopUrls {
    page: Option<String>,
}

impl WikipediaProvider {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: normalize_base(base_url),
            timeout,
        }
    }

    /// `<base>/<segments...>` with each segment percent-encoded.
    fn page_url(&self, segments: &[&str]) -> Option<Url> {
        let mut url = Url::parse(&self.base_url).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(segments);
        Some(url)
    }
}

#[async_trait]
impl Provider for WikipediaProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn lookup(&self, query: &str) -> Option<Source> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let search_url = format!("{}/w/rest.php/v1/search/title", self.base_url);
        let search: SearchResponse = get_json(
            &self.client,
            &search_url,
            &[("q", query), ("limit", "1")],
            self.timeout,
            PROVIDER,
        )
        .await?;

        let matched = search
            .pages
            .into_iter()
            .next()
            .and_then(|p| non_empty(p.title))
            .unwrap_or_else(|| query.to_string());

        let summary_url = self.page_url(&["api", "rest_v1", "page", "summary", &matched])?;
        let summary: PageSummary = get_json(
            &self.client,
            summary_url.as_str(),
            &[],
            self.timeout,
            PROVIDER,
        )
        .await?;

        let url = summary
            .content_urls
            .and_then(|c| c.desktop)
            .and_then(|d| non_empty(d.page))
            .or_else(|| self.page_url(&["wiki", &matched]).map(String::from));

        let mut meta = Map::new();
        meta.insert(
            "lang".into(),
            Value::String(non_empty(summary.lang).unwrap_or_else(|| "en".into())),
        );

        Some(Source {
            provider: PROVIDER.into(),
            title: non_empty(summary.title).unwrap_or(matched),
            url,
            description: non_empty(summary.extract),
            image: summary.thumbnail.and_then(|t| non_empty(t.source)),
            meta: Some(meta),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> WikipediaProvider {
        WikipediaProvider::new(
            build_client().unwrap(),
            server.uri(),
            Duration::from_secs(2),
        )
    }

    #[tokio::test]
    async fn search_then_summary() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/rest.php/v1/search/title"))
            .and(query_param("q", "inception film"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "pages": [{ "title": "Inception" }]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Inception"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Inception",
                "extract": "Inception is a 2010 science fiction action film.",
                "lang": "en",
                "thumbnail": { "source": "https://upload.wikimedia.org/inception.jpg" },
                "content_urls": { "desktop": { "page": "https://en.wikipedia.org/wiki/Inception" } }
            })))
            .mount(&server)
            .await;

        let source = provider(&server).lookup("inception film").await.unwrap();
        assert_eq!(source.provider, "wikipedia");
        assert_eq!(source.title, "Inception");
        assert_eq!(
            source.url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Inception")
        );
        assert!(source.description.unwrap().starts_with("Inception is"));
        assert_eq!(
            source.image.as_deref(),
            Some("https://upload.wikimedia.org/inception.jpg")
        );
        assert_eq!(source.meta.unwrap()["lang"], "en");
    }

    #[tokio::test]
    async fn missing_page_url_falls_back_to_wiki_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/rest.php/v1/search/title"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "pages": []
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Dune"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "extract": ""
            })))
            .mount(&server)
            .await;

        let source = provider(&server).lookup("Dune").await.unwrap();
        assert_eq!(source.title, "Dune");
        assert_eq!(source.url, Some(format!("{}/wiki/Dune", server.uri())));
        assert!(source.description.is_none());
        assert!(source.image.is_none());
    }

    #[tokio::test]
    async fn summary_failure_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/rest.php/v1/search/title"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "pages": [{ "title": "Nowhere" }]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Nowhere"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(provider(&server).lookup("Nowhere").await.is_none());
    }

    #[tokio::test]
    async fn blank_query_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        assert!(provider(&server).lookup("   ").await.is_none());
    }

    #[tokio::test]
    async fn wrongly_shaped_search_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/rest.php/v1/search/title"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "pages": 42 })),
            )
            .mount(&server)
            .await;

        assert!(provider(&server).lookup("Dune").await.is_none());
    }
}
