//! Vision model access for screenlens.
//!
//! - [`client`]: the [`VisionModel`] seam and the OpenAI-compatible client
//! - [`analysis`]: OCR + summary with the description-only retry
//! - [`extract`]: best-effort entity extraction
//! - [`reply`]: lenient JSON reply parsing (code-fence stripping)

pub mod analysis;
pub mod client;
pub mod extract;
pub mod prompts;
pub mod reply;

pub use analysis::{Analyzer, parse_analysis};
pub use client::{CompletionRequest, ImagePayload, OpenAiVision, VisionModel};
pub use extract::{EntityExtractor, parse_entities};
pub use reply::parse_json_reply;
