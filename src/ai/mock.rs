use super::Transport;
use crate::config::BackendMode;
use crate::prompts::Prompt;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Failure,
    Timeout,
}

impl Reply {
    fn into_result(self) -> Result<String> {
        match self {
            Reply::Text(text) => Ok(text),
            Reply::Failure => Err(Error::AiProvider("mock transport failure".to_string())),
            Reply::Timeout => Err(Error::Timeout(Duration::from_secs(30))),
        }
    }
}

/// Scripted transport. Replies cycle when more calls arrive than were queued;
/// clones share state so a test can keep a handle after boxing one.
#[derive(Clone)]
pub struct MockTransport {
    backend: BackendMode,
    completions: Arc<Mutex<Vec<Reply>>>,
    images: Arc<Mutex<Vec<Reply>>>,
    prompts: Arc<Mutex<Vec<Prompt>>>,
    image_prompts: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            backend: BackendMode::Managed,
            completions: Arc::new(Mutex::new(Vec::new())),
            images: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            image_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_backend(mut self, backend: BackendMode) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_completion(self, response: impl Into<String>) -> Self {
        self.push_completion(Reply::Text(response.into()));
        self
    }

    pub fn with_completion_failure(self) -> Self {
        self.push_completion(Reply::Failure);
        self
    }

    pub fn with_completion_timeout(self) -> Self {
        self.push_completion(Reply::Timeout);
        self
    }

    pub fn with_image_response(self, response: impl Into<String>) -> Self {
        self.push_image(Reply::Text(response.into()));
        self
    }

    pub fn with_image_failure(self) -> Self {
        self.push_image(Reply::Failure);
        self
    }

    fn push_completion(&self, reply: Reply) {
        if let Ok(mut completions) = self.completions.lock() {
            completions.push(reply);
        }
    }

    fn push_image(&self, reply: Reply) {
        if let Ok(mut images) = self.images.lock() {
            images.push(reply);
        }
    }

    /// Prompts passed to `complete`, in call order.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn image_prompts(&self) -> Vec<String> {
        self.image_prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn get_call_count(&self) -> usize {
        self.prompts().len() + self.image_prompts().len()
    }

    fn next(replies: &Mutex<Vec<Reply>>, call: usize, default: &str) -> Result<String> {
        let replies = replies
            .lock()
            .map_err(|_| Error::AiProvider("mock transport poisoned".to_string()))?;
        if replies.is_empty() {
            return Ok(default.to_string());
        }
        replies[(call - 1) % replies.len()].clone().into_result()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn backend(&self) -> BackendMode {
        self.backend
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let call = {
            let mut prompts = self
                .prompts
                .lock()
                .map_err(|_| Error::AiProvider("mock transport poisoned".to_string()))?;
            prompts.push(prompt.clone());
            prompts.len()
        };
        Self::next(&self.completions, call, "{}")
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let call = {
            let mut prompts = self
                .image_prompts
                .lock()
                .map_err(|_| Error::AiProvider("mock transport poisoned".to_string()))?;
            prompts.push(prompt.to_string());
            prompts.len()
        };
        Self::next(&self.images, call, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts;

    #[tokio::test]
    async fn test_default_completion_is_empty_object() {
        let transport = MockTransport::new();
        let reply = transport.complete(&prompts::character("森")).await.unwrap();
        assert_eq!(reply, "{}");
    }

    #[tokio::test]
    async fn test_custom_responses_cycle() {
        let transport = MockTransport::new()
            .with_completion("first")
            .with_completion("second");
        let prompt = prompts::poetry("春晓");

        assert_eq!(transport.complete(&prompt).await.unwrap(), "first");
        assert_eq!(transport.complete(&prompt).await.unwrap(), "second");
        assert_eq!(transport.complete(&prompt).await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_failures_and_call_count() {
        let transport = MockTransport::new()
            .with_completion_timeout()
            .with_image_failure();

        assert_eq!(transport.get_call_count(), 0);

        let err = transport
            .complete(&prompts::character("森"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));

        let err = transport.generate_image("a kite").await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));

        assert_eq!(transport.get_call_count(), 2);
        assert_eq!(transport.image_prompts(), vec!["a kite".to_string()]);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let transport = MockTransport::new().with_backend(BackendMode::Proxy);
        let boxed: Box<dyn Transport> = Box::new(transport.clone());

        boxed.complete(&prompts::poetry("")).await.unwrap();
        assert_eq!(boxed.backend(), BackendMode::Proxy);
        assert_eq!(transport.prompts().len(), 1);
    }
}
