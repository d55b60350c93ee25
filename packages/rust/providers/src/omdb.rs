//! Movie/TV adapter backed by OMDb. Without an API key every lookup is `None`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use screenlens_shared::Source;

use crate::Provider;
use crate::http::{get_json, non_empty, normalize_base};

const PROVIDER: &str = "omdb";

pub struct OmdbProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TitleResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default, rename = "Type")]
    kind: Option<String>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default, rename = "imdbID")]
    imdb_id: Option<String>,
    #[serde(default, rename = "imdbRating")]
    imdb_rating: Option<String>,
}

impl OmdbProvider {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: normalize_base(base_url),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            timeout,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl Provider for OmdbProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn lookup(&self, query: &str) -> Option<Source> {
        let api_key = self.api_key.as_deref()?;
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let url = format!("{}/", self.base_url);
        let body: TitleResponse = get_json(
            &self.client,
            &url,
            &[("t", query), ("apikey", api_key)],
            self.timeout,
            PROVIDER,
        )
        .await?;

        if body.response.as_deref() != Some("True") {
            return None;
        }
        let title = non_empty(body.title)?;

        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        let description = format!(
            "{}, {}. {}. IMDb: {}",
            field(&body.kind),
            field(&body.year),
            field(&body.genre),
            field(&body.imdb_rating)
        );

        let mut meta = Map::new();
        for (key, value) in [
            ("year", &body.year),
            ("type", &body.kind),
            ("rating", &body.imdb_rating),
        ] {
            if let Some(v) = value {
                meta.insert(key.into(), Value::String(v.clone()));
            }
        }

        Some(Source {
            provider: PROVIDER.into(),
            title,
            url: non_empty(body.imdb_id).map(|id| format!("https://www.imdb.com/title/{id}")),
            description: Some(description),
            image: non_empty(body.poster).filter(|p| p != "N/A"),
            meta: (!meta.is_empty()).then_some(meta),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, key: Option<&str>) -> OmdbProvider {
        OmdbProvider::new(
            build_client().unwrap(),
            server.uri(),
            key.map(String::from),
            Duration::from_secs(2),
        )
    }

    #[tokio::test]
    async fn maps_title_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("t", "Inception"))
            .and(query_param("apikey", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Response": "True",
                "Title": "Inception",
                "Year": "2010",
                "Type": "movie",
                "Genre": "Action, Sci-Fi",
                "Poster": "https://m.media-amazon.com/poster.jpg",
                "imdbID": "tt1375666",
                "imdbRating": "8.8"
            })))
            .mount(&server)
            .await;

        let source = provider(&server, Some("secret"))
            .lookup("Inception")
            .await
            .unwrap();
        assert_eq!(source.provider, "omdb");
        assert_eq!(
            source.url.as_deref(),
            Some("https://www.imdb.com/title/tt1375666")
        );
        assert_eq!(
            source.description.as_deref(),
            Some("movie, 2010. Action, Sci-Fi. IMDb: 8.8")
        );
        assert_eq!(
            source.image.as_deref(),
            Some("https://m.media-amazon.com/poster.jpg")
        );
        let meta = source.meta.unwrap();
        assert_eq!(meta["rating"], "8.8");
        assert_eq!(meta["type"], "movie");
    }

    #[tokio::test]
    async fn not_found_and_na_poster() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("t", "Missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Response": "False",
                "Error": "Movie not found!"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(query_param("t", "Obscure"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Response": "True",
                "Title": "Obscure",
                "Poster": "N/A",
                "imdbID": "tt0000001"
            })))
            .mount(&server)
            .await;

        let omdb = provider(&server, Some("k"));
        assert!(omdb.lookup("Missing").await.is_none());
        let source = omdb.lookup("Obscure").await.unwrap();
        assert!(source.image.is_none());
    }

    #[tokio::test]
    async fn without_key_is_noop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let omdb = provider(&server, None);
        assert!(!omdb.is_enabled());
        assert!(omdb.lookup("Inception").await.is_none());
    }
}
