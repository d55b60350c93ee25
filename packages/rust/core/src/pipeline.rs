//! End-to-end analysis: image → OCR/summary → entities → enrichment → result.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use screenlens_providers::ProviderSet;
use screenlens_shared::{AnalysisResult, AppConfig, Enrichment, ImageInput, Result};
use screenlens_vision::{Analyzer, EntityExtractor, OpenAiVision, VisionModel};

use crate::enrichment::Enricher;

/// Per-request options.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Replaces the default stage-1 user prompt when non-blank.
    pub prompt: Option<String>,
    /// Run entity extraction and provider lookups.
    pub enrich: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            prompt: None,
            enrich: true,
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &AnalysisResult);
}

/// No-op progress reporter for the server and tests.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &AnalysisResult) {}
}

/// The analysis pipeline with all collaborators wired in.
#[derive(Clone)]
pub struct Pipeline {
    analyzer: Analyzer,
    extractor: EntityExtractor,
    enricher: Enricher,
}

impl Pipeline {
    pub fn new(analyzer: Analyzer, extractor: EntityExtractor, enricher: Enricher) -> Self {
        Self {
            analyzer,
            extractor,
            enricher,
        }
    }

    /// Wire one vision model and a provider set using config values.
    pub fn with_model(
        model: Arc<dyn VisionModel>,
        providers: ProviderSet,
        config: &AppConfig,
    ) -> Self {
        Self::new(
            Analyzer::new(model.clone()).with_temperature(config.vision.temperature),
            EntityExtractor::new(model).with_max_entities(config.enrichment.max_entities),
            Enricher::from_config(providers, &config.enrichment),
        )
    }

    /// Build the production pipeline. Fails when the vision credential is missing.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let model: Arc<dyn VisionModel> = Arc::new(OpenAiVision::from_config(config)?);
        let providers = ProviderSet::from_config(config)?;
        Ok(Self::with_model(model, providers, config))
    }

    /// Analyze one normalized image.
    ///
    /// Vision failures in the analysis stage are returned; extraction and
    /// enrichment failures only ever shrink the enrichment block. Enrichment
    /// is skipped when the final OCR text is blank.
    #[instrument(skip_all, fields(mime = %image.mime, enrich = options.enrich))]
    pub async fn analyze_screenshot(
        &self,
        image: &ImageInput,
        options: &AnalyzeOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<AnalysisResult> {
        let start = Instant::now();

        progress.phase("Reading screenshot");
        let analysis = self
            .analyzer
            .analyze(image, options.prompt.as_deref())
            .await?;

        let mut enrichment = Enrichment::default();
        if options.enrich && !analysis.text.is_empty() {
            let summary_text = analysis.summary_text();

            progress.phase("Extracting entities");
            enrichment.entities = self.extractor.extract(&analysis.text, &summary_text).await;

            if !enrichment.entities.is_empty() {
                progress.phase("Looking up sources");
                enrichment.sources = self
                    .enricher
                    .enrich(&enrichment.entities, &summary_text)
                    .await;
            }
        }

        let result = AnalysisResult::new(analysis, enrichment);
        info!(
            entities = result.enrichment.entities.len(),
            sources = result.enrichment.sources.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "analysis finished"
        );
        progress.done(&result);
        Ok(result)
    }
}
