//! Core screenlens logic: entity classification, the enrichment
//! orchestrator, upload normalization and the end-to-end pipeline.

pub mod classifier;
pub mod enrichment;
pub mod media;
pub mod pipeline;

pub use classifier::{Category, classify};
pub use enrichment::{Enricher, PlannedCall, dedup_and_cap};
pub use media::normalize_image;
pub use pipeline::{AnalyzeOptions, Pipeline, ProgressReporter, SilentProgress};
