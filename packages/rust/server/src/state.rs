use std::sync::Arc;

use screenlens_core::Pipeline;
use screenlens_shared::{AppConfig, Result, ScreenlensError};

/// Shared handler state.
///
/// The server boots without a vision credential so `/health` keeps working;
/// in that case `/analyze` answers with a configuration error.
#[derive(Clone)]
pub struct AppState {
    pipeline: Option<Arc<Pipeline>>,
    credential_env: String,
}

impl AppState {
    pub fn new(pipeline: Pipeline, credential_env: impl Into<String>) -> Self {
        Self {
            pipeline: Some(Arc::new(pipeline)),
            credential_env: credential_env.into(),
        }
    }

    /// State for a server whose vision credential is not configured.
    pub fn without_pipeline(credential_env: impl Into<String>) -> Self {
        Self {
            pipeline: None,
            credential_env: credential_env.into(),
        }
    }

    /// Build the production pipeline, tolerating a missing credential.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let env = config.vision.api_key_env.clone();
        match Pipeline::from_config(config) {
            Ok(pipeline) => Ok(Self::new(pipeline, env)),
            Err(ScreenlensError::Config { message }) => {
                tracing::warn!("{message}; /analyze will be unavailable");
                Ok(Self::without_pipeline(env))
            }
            Err(e) => Err(e),
        }
    }

    pub fn pipeline(&self) -> Result<&Pipeline> {
        self.pipeline.as_deref().ok_or_else(|| {
            ScreenlensError::config(format!("{} is not set on server", self.credential_env))
        })
    }
}
