//! The vision/language capability: "given an image and a prompt, return JSON".
//!
//! [`VisionModel`] is the seam the analysis pipeline and the entity extractor
//! depend on. [`OpenAiVision`] speaks the OpenAI-compatible chat completions
//! API with JSON-constrained output.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use screenlens_shared::{AppConfig, ImageInput, Result, ScreenlensError, resolve_vision_key};

/// User-Agent string for model requests.
const USER_AGENT: &str = concat!("screenlens/", env!("CARGO_PKG_VERSION"));

/// Connection establishment timeout. The request itself has no deadline.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Base64-encoded image attached to a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime: String,
    pub base64: String,
}

impl ImagePayload {
    pub fn from_image(image: &ImageInput) -> Self {
        Self {
            mime: image.mime.clone(),
            base64: STANDARD.encode(&image.bytes),
        }
    }

    /// `data:` URL form used in the chat message.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

/// One JSON-mode completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub image: Option<ImagePayload>,
    pub temperature: f32,
}

/// A model that answers a prompt (optionally with an image) with a JSON string.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Run one completion and return the raw reply text.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    /// Model identifier for tracing.
    fn model_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// OpenAI-compatible implementation
// ---------------------------------------------------------------------------

/// Chat completions client for OpenAI-compatible endpoints.
pub struct OpenAiVision {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiVision {
    /// Create a client for `model` at `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ScreenlensError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Build from config, failing with a config error when the key env var is unset.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = resolve_vision_key(config)?;
        Self::new(api_key, &config.vision.model, &config.vision.base_url)
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let user_content = match &request.image {
            Some(image) => json!([
                { "type": "text", "text": request.user },
                { "type": "image_url", "image_url": { "url": image.data_url() } }
            ]),
            None => Value::String(request.user.clone()),
        };

        json!({
            "model": self.model,
            "temperature": request.temperature,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": user_content }
            ],
            "response_format": { "type": "json_object" }
        })
    }
}

#[async_trait]
impl VisionModel for OpenAiVision {
    #[instrument(skip_all, fields(model = %self.model, with_image = request.image.is_some()))]
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(&request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScreenlensError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ScreenlensError::Network(format!(
                "vision model returned HTTP {status}: {}",
                detail.chars().take(300).collect::<String>()
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ScreenlensError::upstream_format(format!("unexpected completion body: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "{}".to_string());

        debug!(reply_len = content.len(), "completion received");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
