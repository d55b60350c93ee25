//! Application configuration for screenlens.
//!
//! User config lives at `~/.screenlens/screenlens.toml`.
//! Environment variables override config file values, which override defaults.
//! Secrets are never stored in the file: the config names the env var that
//! holds them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScreenlensError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "screenlens.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".screenlens";

// ---------------------------------------------------------------------------
// Config structs (matching screenlens.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Vision model settings.
    #[serde(default)]
    pub vision: VisionConfig,

    /// Enrichment fan-out limits.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// External provider endpoints and credentials.
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum accepted request body size.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    4000
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

/// `[vision]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for OCR, summary and entity extraction.
    #[serde(default = "default_model")]
    pub model: String,

    /// OpenAI-compatible API root.
    #[serde(default = "default_vision_base_url")]
    pub base_url: String,

    /// Sampling temperature for the analysis stages.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_vision_base_url(),
            temperature: default_temperature(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_vision_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_temperature() -> f32 {
    0.1
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Global wall-clock budget for the whole provider fan-out.
    #[serde(default = "default_budget_ms")]
    pub budget_ms: u64,

    /// Per-call timeout for API-backed providers.
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,

    /// Per-call timeout for web searches.
    #[serde(default = "default_web_search_timeout_ms")]
    pub web_search_timeout_ms: u64,

    /// Maximum number of sources returned per request.
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Maximum number of entities kept from the extractor.
    #[serde(default = "default_max_entities")]
    pub max_entities: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            budget_ms: default_budget_ms(),
            provider_timeout_ms: default_provider_timeout_ms(),
            web_search_timeout_ms: default_web_search_timeout_ms(),
            max_sources: default_max_sources(),
            max_entities: default_max_entities(),
        }
    }
}

impl EnrichmentConfig {
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn web_search_timeout(&self) -> Duration {
        Duration::from_millis(self.web_search_timeout_ms)
    }
}

fn default_budget_ms() -> u64 {
    7_000
}
fn default_provider_timeout_ms() -> u64 {
    5_000
}
fn default_web_search_timeout_ms() -> u64 {
    6_000
}
/// Upper bound on sources in one response.
pub const MAX_SOURCES_LIMIT: usize = 5;
/// Upper bound on entities taken from one extraction.
pub const MAX_ENTITIES_LIMIT: usize = 3;

fn default_max_sources() -> usize {
    MAX_SOURCES_LIMIT
}
fn default_max_entities() -> usize {
    MAX_ENTITIES_LIMIT
}

/// `[providers]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Name of the env var holding the OMDb key. Unset disables the movie/TV adapter.
    #[serde(default = "default_omdb_api_key_env")]
    pub omdb_api_key_env: String,

    #[serde(default = "default_wikipedia_url")]
    pub wikipedia_url: String,

    #[serde(default = "default_omdb_url")]
    pub omdb_url: String,

    #[serde(default = "default_openlibrary_url")]
    pub openlibrary_url: String,

    #[serde(default = "default_itunes_url")]
    pub itunes_url: String,

    #[serde(default = "default_web_search_url")]
    pub web_search_url: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            omdb_api_key_env: default_omdb_api_key_env(),
            wikipedia_url: default_wikipedia_url(),
            omdb_url: default_omdb_url(),
            openlibrary_url: default_openlibrary_url(),
            itunes_url: default_itunes_url(),
            web_search_url: default_web_search_url(),
        }
    }
}

fn default_omdb_api_key_env() -> String {
    "OMDB_API_KEY".into()
}
fn default_wikipedia_url() -> String {
    "https://en.wikipedia.org".into()
}
fn default_omdb_url() -> String {
    "https://www.omdbapi.com".into()
}
fn default_openlibrary_url() -> String {
    "https://openlibrary.org".into()
}
fn default_itunes_url() -> String {
    "https://itunes.apple.com".into()
}
fn default_web_search_url() -> String {
    "https://duckduckgo.com".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.screenlens/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ScreenlensError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.screenlens/screenlens.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ScreenlensError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ScreenlensError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ScreenlensError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ScreenlensError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ScreenlensError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Apply the process environment on top of a loaded config.
///
/// Recognised: `PORT`, `OPENAI_MODEL`, `CORS_ORIGINS` (comma separated).
pub fn apply_env_overrides(config: &mut AppConfig) {
    apply_overrides_with(config, |name| std::env::var(name).ok());
}

/// Same as [`apply_env_overrides`] with an injectable lookup.
pub fn apply_overrides_with(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(port) = lookup("PORT") {
        match port.trim().parse() {
            Ok(p) => config.server.port = p,
            Err(_) => tracing::warn!(%port, "ignoring unparseable PORT"),
        }
    }

    if let Some(model) = lookup("OPENAI_MODEL").filter(|m| !m.trim().is_empty()) {
        config.vision.model = model.trim().to_string();
    }

    if let Some(origins) = lookup("CORS_ORIGINS") {
        config.server.cors_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
}

/// Check semantic constraints serde cannot express.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if !(1..=MAX_SOURCES_LIMIT).contains(&config.enrichment.max_sources) {
        return Err(ScreenlensError::validation(format!(
            "enrichment.max_sources {} is outside 1..={MAX_SOURCES_LIMIT}",
            config.enrichment.max_sources
        )));
    }
    if !(1..=MAX_ENTITIES_LIMIT).contains(&config.enrichment.max_entities) {
        return Err(ScreenlensError::validation(format!(
            "enrichment.max_entities {} is outside 1..={MAX_ENTITIES_LIMIT}",
            config.enrichment.max_entities
        )));
    }
    if config.enrichment.budget_ms == 0 {
        return Err(ScreenlensError::validation(
            "enrichment.budget_ms must be greater than zero",
        ));
    }
    if !(0.0..=2.0).contains(&config.vision.temperature) {
        return Err(ScreenlensError::validation(format!(
            "vision.temperature {} is outside 0.0..=2.0",
            config.vision.temperature
        )));
    }
    Ok(())
}

/// Read the vision API key from the env var named in the config.
pub fn resolve_vision_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.vision.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(ScreenlensError::config(format!(
            "{var_name} is not set on server"
        ))),
    }
}

/// Read the optional OMDb key. `None` turns the movie/TV adapter into a no-op.
pub fn resolve_omdb_key(config: &AppConfig) -> Option<String> {
    std::env::var(&config.providers.omdb_api_key_env)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("budget_ms"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[server]
port = 8080

[enrichment]
budget_ms = 2500
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.enrichment.budget(), Duration::from_millis(2500));
        assert_eq!(config.enrichment.max_sources, 5);
        assert_eq!(config.vision.model, "gpt-4o-mini");
        assert_eq!(config.providers.wikipedia_url, "https://en.wikipedia.org");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        apply_overrides_with(&mut config, |name| match name {
            "PORT" => Some("5050".into()),
            "OPENAI_MODEL" => Some("gpt-4o".into()),
            "CORS_ORIGINS" => Some("https://a.example, ,https://b.example".into()),
            _ => None,
        });
        assert_eq!(config.server.port, 5050);
        assert_eq!(config.vision.model, "gpt-4o");
        assert_eq!(
            config.server.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn bad_port_is_ignored() {
        let mut config = AppConfig::default();
        apply_overrides_with(&mut config, |name| {
            (name == "PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn validation_rejects_zero_sources() {
        let mut config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        config.enrichment.max_sources = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn validation_bounds_source_and_entity_caps() {
        let mut config = AppConfig::default();
        config.enrichment.max_sources = 50;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ScreenlensError::Validation { .. }));
        assert!(err.to_string().contains("max_sources"));

        let mut config = AppConfig::default();
        config.enrichment.max_entities = 10;
        assert!(validate_config(&config).unwrap_err().to_string().contains("max_entities"));

        config.enrichment.max_entities = 0;
        assert!(validate_config(&config).is_err());

        config.enrichment.max_entities = 1;
        config.enrichment.max_sources = 1;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn vision_key_missing_is_config_error() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.vision.api_key_env = "SL_TEST_NONEXISTENT_KEY_12345".into();
        let err = resolve_vision_key(&config).unwrap_err();
        assert!(matches!(err, ScreenlensError::Config { .. }));
        assert!(err.to_string().contains("SL_TEST_NONEXISTENT_KEY_12345"));
    }

    #[test]
    fn omdb_key_missing_is_none() {
        let mut config = AppConfig::default();
        config.providers.omdb_api_key_env = "SL_TEST_NONEXISTENT_OMDB_67890".into();
        assert!(resolve_omdb_key(&config).is_none());
    }
}
