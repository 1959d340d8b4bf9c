//! Managed backend: Google Gemini `generateContent`.

mod chat;
pub mod client;
mod image;
pub mod types;

use crate::ai::Transport;
use crate::config::BackendMode;
use crate::prompts::Prompt;
use crate::Result;
use async_trait::async_trait;
use client::GeminiHttpClient;
use std::time::Duration;

const TEXT_TIMEOUT: Duration = Duration::from_secs(60);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(120);

pub struct GeminiTransport {
    text: GeminiHttpClient,
    image: GeminiHttpClient,
}

impl GeminiTransport {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            text: GeminiHttpClient::new_with_client(
                api_key.clone(),
                model,
                TEXT_TIMEOUT,
                client.clone(),
            ),
            image: GeminiHttpClient::new_with_client(
                api_key,
                crate::ai::IMAGE_MODEL.to_string(),
                IMAGE_TIMEOUT,
                client,
            ),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.text = self.text.with_base_url(base_url.clone());
        self.image = self.image.with_base_url(base_url);
        self
    }

    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.text = self.text.with_timeout(timeout);
        self.image = self.image.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl Transport for GeminiTransport {
    fn backend(&self) -> BackendMode {
        BackendMode::Managed
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        self.complete_text(prompt).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        self.render_image(prompt).await
    }
}
