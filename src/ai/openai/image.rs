use super::types::{ChatCompletionRequest, ChatMessage, ChatMessageContent};
use super::{proxy_model_name, OpenAiTransport};
use crate::{Error, Result};

impl OpenAiTransport {
    /// Image generation through the chat endpoint. Proxies disagree on where
    /// the picture goes, so the raw content is returned for the extractor.
    pub(super) async fn image(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: proxy_model_name(crate::ai::IMAGE_MODEL).to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: ChatMessageContent::Text(format!("Generate an image: {}", prompt)),
            }],
            temperature: None,
            max_tokens: None,
            response_format: None,
        };

        let response = self.http.chat_completion(&request).await?;

        if let Some(image) = response.first_image() {
            tracing::debug!("Proxy returned image in message.images");
            return Ok(image.to_string());
        }

        response
            .content()
            .ok_or_else(|| Error::AiProvider("No image content in proxy response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::ai::{OpenAiTransport, Transport};
    use crate::Error;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> OpenAiTransport {
        OpenAiTransport::new_with_client(
            "test-key".to_string(),
            server.uri(),
            "gemini-2.5-pro".to_string(),
            reqwest::Client::new(),
        )
    }

    #[tokio::test]
    async fn test_generate_image_uses_image_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "google/gemini-2.5-flash-image",
                "messages": [{ "role": "user", "content": "Generate an image: a kite" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": { "role": "assistant", "content": "![kite](https://x.example/k.png)" }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let raw = transport(&server).generate_image("a kite").await.unwrap();
        assert_eq!(raw, "![kite](https://x.example/k.png)");
    }

    #[tokio::test]
    async fn test_generate_image_prefers_message_images() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "",
                        "images": [{ "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let raw = transport(&server).generate_image("a kite").await.unwrap();
        assert_eq!(raw, "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn test_generate_image_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let err = transport(&server).generate_image("a kite").await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }
}
