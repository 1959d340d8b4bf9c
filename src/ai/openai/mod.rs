//! Proxy backend: any OpenAI-compatible `chat/completions` endpoint.

mod chat;
pub mod client;
mod image;
pub mod types;

use crate::ai::Transport;
use crate::config::BackendMode;
use crate::prompts::Prompt;
use crate::Result;
use async_trait::async_trait;
use client::OpenAiHttpClient;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gateway model ids and the names proxies know them by.
const MODEL_MAP: &[(&str, &str)] = &[
    ("gemini-2.5-flash", "google/gemini-2.5-pro"),
    ("gemini-2.5-pro", "google/gemini-2.5-pro"),
    ("gemini-1.5-flash", "google/gemini-1.5-pro"),
    ("gemini-1.5-pro", "google/gemini-1.5-pro"),
    ("gemini-2.5-flash-image", "google/gemini-2.5-flash-image"),
];

const DEFAULT_PROXY_MODEL: &str = "google/gemini-2.5-pro";

pub fn proxy_model_name(model: &str) -> &'static str {
    MODEL_MAP
        .iter()
        .find(|(gateway, _)| *gateway == model)
        .map(|(_, proxy)| *proxy)
        .unwrap_or(DEFAULT_PROXY_MODEL)
}

pub struct OpenAiTransport {
    http: OpenAiHttpClient,
    model: &'static str,
}

impl OpenAiTransport {
    pub fn new_with_client(
        api_key: String,
        endpoint: String,
        model: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, endpoint, REQUEST_TIMEOUT, client),
            model: proxy_model_name(&model),
        }
    }

    #[cfg(test)]
    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl Transport for OpenAiTransport {
    fn backend(&self) -> BackendMode {
        BackendMode::Proxy
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        self.chat(prompt).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        self.image(prompt).await
    }
}
