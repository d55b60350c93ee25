//! Shared types, error model, and configuration for screenlens.
//!
//! This crate is the foundation depended on by all other screenlens crates.
//! It provides:
//! - [`ScreenlensError`] — the unified error type
//! - Domain types ([`Entity`], [`Source`], [`Analysis`], [`AnalysisResult`])
//! - Configuration ([`AppConfig`], config loading, env overrides)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EnrichmentConfig, MAX_ENTITIES_LIMIT, MAX_SOURCES_LIMIT, ProvidersConfig, ServerConfig, VisionConfig,
    apply_env_overrides, apply_overrides_with, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_omdb_key, resolve_vision_key, validate_config,
};
pub use error::{Result, ScreenlensError};
pub use types::{Analysis, AnalysisResult, Enrichment, Entity, EntityType, ImageInput, Source};
