//! Core domain types exchanged between the analysis, enrichment and HTTP layers.
//!
//! Everything here is request-scoped: nothing is persisted.

use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// ImageInput
// ---------------------------------------------------------------------------

/// A normalized image ready to be sent to the vision model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// Raw image bytes in one of the allow-listed formats.
    pub bytes: Vec<u8>,
    /// Canonical MIME type (`image/png`, `image/jpeg`, `image/gif`, `image/webp`).
    pub mime: String,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// OCR text, English bullet summary and headings for one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// Visible text in its original language.
    pub text: String,
    /// Short English bullet points.
    pub summary: Vec<String>,
    /// Visible headings, in English.
    pub headings: Vec<String>,
}

impl Analysis {
    /// No text and no summary: the trigger for the description-only retry.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.summary.is_empty()
    }

    /// The summary bullets joined with newlines, as fed to extraction and classification.
    pub fn summary_text(&self) -> String {
        self.summary.join("\n")
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Closed set of entity types the extractor may declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EntityType {
    Movie,
    Tv,
    Book,
    Music,
    ProductPerfume,
    ProductElectronics,
    ProductCosmetics,
    Product,
    Person,
    Game,
    App,
    Website,
    Brand,
    #[default]
    Other,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Book => "book",
            Self::Music => "music",
            Self::ProductPerfume => "product-perfume",
            Self::ProductElectronics => "product-electronics",
            Self::ProductCosmetics => "product-cosmetics",
            Self::Product => "product",
            Self::Person => "person",
            Self::Game => "game",
            Self::App => "app",
            Self::Website => "website",
            Self::Brand => "brand",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = std::convert::Infallible;

    /// Never fails: anything unrecognised is [`EntityType::Other`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let kind = match s.trim().to_lowercase().as_str() {
            "movie" => Self::Movie,
            "tv" => Self::Tv,
            "book" => Self::Book,
            "music" => Self::Music,
            "product-perfume" => Self::ProductPerfume,
            "product-electronics" => Self::ProductElectronics,
            "product-cosmetics" => Self::ProductCosmetics,
            "product" => Self::Product,
            "person" => Self::Person,
            "game" => Self::Game,
            "app" => Self::App,
            "website" => Self::Website,
            "brand" => Self::Brand,
            _ => Self::Other,
        };
        Ok(kind)
    }
}

impl Serialize for EntityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Value::String(s)) => s.parse().unwrap_or_default(),
            _ => Self::Other,
        })
    }
}

/// A notable real-world thing the vision model saw in the image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(rename = "type", default)]
    pub kind: EntityType,
    #[serde(default, deserialize_with = "lenient_string_or_empty")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_year",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<i32>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub brand: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_or_empty")]
    pub search_query: String,
    #[serde(
        default,
        deserialize_with = "lenient_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub extra: Option<Map<String, Value>>,
}

impl Entity {
    /// Convenience constructor used by tests and callers building entities by hand.
    pub fn new(kind: EntityType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            ..Default::default()
        }
    }

    /// The query to send to providers: the model's `searchQuery`, else the name.
    pub fn query(&self) -> &str {
        let q = self.search_query.trim();
        if q.is_empty() { self.name.trim() } else { q }
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .and_then(value_to_string)
        .filter(|s| !s.trim().is_empty()))
}

fn lenient_string_or_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(value_to_string).unwrap_or_default())
}

fn lenient_year<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i32>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|y| i32::try_from(y).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_object<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Map<String, Value>>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// One external reference record returned by a provider adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Provider label (`wikipedia`, `omdb`, `gsmarena`, `web`, ...).
    pub provider: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl Source {
    /// A bare title+url record (what web search produces).
    pub fn link(provider: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            title: title.into(),
            url: Some(url.into()),
            description: None,
            image: None,
            meta: None,
        }
    }

    /// Deduplication key: provider plus url, or title when there is no url.
    pub fn dedup_key(&self) -> String {
        let locator = self
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.title);
        format!("{}|{}", self.provider, locator)
    }
}

// ---------------------------------------------------------------------------
// Enrichment / AnalysisResult
// ---------------------------------------------------------------------------

/// Entities found in the image and the pooled sources found for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub entities: Vec<Entity>,
    pub sources: Vec<Source>,
}

/// The final response body of one analysis request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub text: String,
    pub summary: Vec<String>,
    pub headings: Vec<String>,
    pub enrichment: Enrichment,
}

impl AnalysisResult {
    pub fn new(analysis: Analysis, enrichment: Enrichment) -> Self {
        Self {
            text: analysis.text,
            summary: analysis.summary,
            headings: analysis.headings,
            enrichment,
        }
    }
}
