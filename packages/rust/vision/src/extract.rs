//! Entity extraction: ask the model for up to a few notable real-world
//! things named in the analysis text and summary.
//!
//! Extraction is best-effort. Any failure yields an empty list.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use screenlens_shared::{Entity, MAX_ENTITIES_LIMIT, Result};

use crate::client::{CompletionRequest, VisionModel};
use crate::prompts::{EXTRACTION_SYSTEM, extraction_prompt};
use crate::reply::parse_json_reply;

/// Default cap on entities taken from one reply.
pub const DEFAULT_MAX_ENTITIES: usize = MAX_ENTITIES_LIMIT;

#[derive(Clone)]
pub struct EntityExtractor {
    model: Arc<dyn VisionModel>,
    max_entities: usize,
}

impl EntityExtractor {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self {
            model,
            max_entities: DEFAULT_MAX_ENTITIES,
        }
    }

    /// Lower the entity cap. Values above [`DEFAULT_MAX_ENTITIES`] are clamped.
    pub fn with_max_entities(mut self, max_entities: usize) -> Self {
        self.max_entities = max_entities.min(DEFAULT_MAX_ENTITIES);
        self
    }

    /// Extract entities from OCR text and the joined summary bullets.
    ///
    /// Never fails: transport errors, malformed replies and malformed
    /// elements all degrade to fewer (or zero) entities.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub async fn extract(&self, text: &str, summary: &str) -> Vec<Entity> {
        match self.try_extract(text, summary).await {
            Ok(entities) => {
                debug!(count = entities.len(), "entities extracted");
                entities
            }
            Err(e) => {
                warn!(error = %e, "entity extraction failed");
                Vec::new()
            }
        }
    }

    async fn try_extract(&self, text: &str, summary: &str) -> Result<Vec<Entity>> {
        let raw = self
            .model
            .complete(CompletionRequest {
                system: EXTRACTION_SYSTEM.to_string(),
                user: extraction_prompt(text, summary),
                image: None,
                temperature: 0.0,
            })
            .await?;
        let value = parse_json_reply(&raw)?;
        Ok(parse_entities(&value, self.max_entities))
    }
}

/// Take the first `max` elements of `entities` and keep those that decode.
///
/// The cap applies before filtering, so a malformed element still uses up a slot.
pub fn parse_entities(value: &Value, max: usize) -> Vec<Entity> {
    let Some(items) = value.get("entities").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .take(max)
        .filter(|item| item.is_object())
        .filter_map(|item| serde_json::from_value::<Entity>(item.clone()).ok())
        .collect()
}
