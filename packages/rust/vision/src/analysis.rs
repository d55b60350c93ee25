//! Two-stage screenshot analysis: OCR + summary, then a description-only
//! retry when the first pass comes back empty.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use screenlens_shared::{Analysis, ImageInput, Result};

use crate::client::{CompletionRequest, ImagePayload, VisionModel};
use crate::prompts::{ANALYSIS_PROMPT, ANALYSIS_SYSTEM, DESCRIPTION_PROMPT, DESCRIPTION_SYSTEM};
use crate::reply::{parse_json_reply, string_field, string_list_field};

/// Default sampling temperature for both analysis stages.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Runs the OCR/summary pipeline against a [`VisionModel`].
#[derive(Clone)]
pub struct Analyzer {
    model: Arc<dyn VisionModel>,
    temperature: f32,
}

impl Analyzer {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self {
            model,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Analyze one image.
    ///
    /// A non-blank `prompt_override` replaces the stage-1 user prompt. When
    /// stage 1 yields neither text nor summary, a description-only request is
    /// made and its result replaces the first one wholesale; an unparseable
    /// stage-2 reply leaves the (empty) stage-1 result in place.
    #[instrument(skip_all, fields(model = self.model.model_name(), mime = %image.mime))]
    pub async fn analyze(
        &self,
        image: &ImageInput,
        prompt_override: Option<&str>,
    ) -> Result<Analysis> {
        let payload = ImagePayload::from_image(image);
        let user_prompt = prompt_override
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(ANALYSIS_PROMPT);

        let raw = self
            .model
            .complete(CompletionRequest {
                system: ANALYSIS_SYSTEM.to_string(),
                user: user_prompt.to_string(),
                image: Some(payload.clone()),
                temperature: self.temperature,
            })
            .await?;
        let first = parse_analysis(&raw)?;

        if !first.is_empty() {
            info!(
                text_len = first.text.len(),
                bullets = first.summary.len(),
                "analysis complete"
            );
            return Ok(first);
        }

        info!("first pass empty, requesting description");
        let raw = self
            .model
            .complete(CompletionRequest {
                system: DESCRIPTION_SYSTEM.to_string(),
                user: DESCRIPTION_PROMPT.to_string(),
                image: Some(payload),
                temperature: self.temperature,
            })
            .await?;

        match parse_analysis(&raw) {
            Ok(second) => Ok(second),
            Err(e) => {
                warn!(error = %e, "description reply unparseable, keeping empty analysis");
                Ok(first)
            }
        }
    }
}

/// Parse a model reply into an [`Analysis`], coercing missing or mistyped
/// fields to empty values.
pub fn parse_analysis(raw: &str) -> Result<Analysis> {
    let value = parse_json_reply(raw)?;
    Ok(analysis_from_value(&value))
}

fn analysis_from_value(value: &Value) -> Analysis {
    Analysis {
        text: string_field(value, "text"),
        summary: string_list_field(value, "summary"),
        headings: string_list_field(value, "headings"),
    }
}
