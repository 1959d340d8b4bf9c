//! Backend transports
//!
//! Both backends implement [`Transport`], so prompt builders and the
//! normalizer are written once. [`select`] picks one from a resolved
//! [`Configuration`] and refuses early when the active mode has no usable
//! credentials.

pub mod gemini;
pub mod mime;
pub mod mock;
pub mod openai;

pub use gemini::GeminiTransport;
pub use mock::MockTransport;
pub use openai::OpenAiTransport;

use crate::config::{BackendMode, Configuration};
use crate::prompts::Prompt;
use crate::{Error, Result};
use async_trait::async_trait;

/// Gateway-level id of the image generation model.
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";

#[async_trait]
pub trait Transport: Send + Sync {
    fn backend(&self) -> BackendMode;

    /// Run one prompt and return the raw reply text. JSON mode is requested
    /// when the prompt carries a schema.
    async fn complete(&self, prompt: &Prompt) -> Result<String>;

    /// Ask for an illustration and return whatever the backend sent back,
    /// unparsed.
    async fn generate_image(&self, prompt: &str) -> Result<String>;
}

/// Build the transport for `config`, sharing `client`'s connection pool.
pub fn select(config: &Configuration, client: reqwest::Client) -> Result<Box<dyn Transport>> {
    if !config.has_credentials() {
        return Err(Error::MissingCredentials(match config.backend_mode {
            BackendMode::Managed => "no API key configured for official mode".to_string(),
            BackendMode::Proxy => "proxy URL or proxy API key not configured".to_string(),
        }));
    }

    match config.backend_mode {
        BackendMode::Managed => {
            tracing::info!("Backend: Gemini (model: {})", config.model);
            Ok(Box::new(GeminiTransport::new_with_client(
                config.managed_api_key.clone(),
                config.model.clone(),
                client,
            )))
        }
        BackendMode::Proxy => {
            tracing::info!(
                "Backend: proxy {} (model: {})",
                config.proxy_endpoint,
                openai::proxy_model_name(&config.model)
            );
            Ok(Box::new(OpenAiTransport::new_with_client(
                config.proxy_api_key.clone(),
                config.proxy_endpoint.clone(),
                config.model.clone(),
                client,
            )))
        }
    }
}
