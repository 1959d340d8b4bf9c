use super::types::{
    ChatCompletionRequest, ChatMessage, ChatMessageContent, MessagePart, ResponseFormat,
};
use super::OpenAiTransport;
use crate::prompts::Prompt;
use crate::{Error, Result};

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 2000;

impl OpenAiTransport {
    pub(super) async fn chat(&self, prompt: &Prompt) -> Result<String> {
        let content = match &prompt.attachment {
            Some(image) => ChatMessageContent::Parts(vec![
                MessagePart::text(prompt.instruction.clone()),
                MessagePart::image(image.clone()),
            ]),
            None => ChatMessageContent::Text(prompt.instruction.clone()),
        };

        let request = ChatCompletionRequest {
            model: self.model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            temperature: Some(TEMPERATURE),
            max_tokens: Some(MAX_TOKENS),
            response_format: prompt.json_mode().then(ResponseFormat::json_object),
        };

        let response = self.http.chat_completion(&request).await?;

        response
            .content()
            .ok_or_else(|| Error::AiProvider("Invalid response format from proxy API".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::ai::{OpenAiTransport, Transport};
    use crate::{prompts, Error};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer, model: &str) -> OpenAiTransport {
        OpenAiTransport::new_with_client(
            "test-key".to_string(),
            format!("{}/", server.uri()),
            model.to_string(),
            reqwest::Client::new(),
        )
    }

    #[tokio::test]
    async fn test_complete_sends_mapped_model_and_json_mode() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "google/gemini-1.5-pro",
                "temperature": 0.7,
                "max_tokens": 2000,
                "response_format": { "type": "json_object" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": { "role": "assistant", "content": "{\"char\":\"森\"}" },
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = transport(&server, "gemini-1.5-flash")
            .complete(&prompts::character("森"))
            .await
            .unwrap();
        assert_eq!(text, "{\"char\":\"森\"}");
    }

    #[tokio::test]
    async fn test_complete_sends_attachment_as_image_part() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [{
                    "role": "user",
                    "content": [
                        { "type": "text" },
                        { "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } }
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "{}" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let prompt = prompts::composition_guide("堆雪人", Some("data:image/png;base64,AAAA"));
        transport(&server, "gemini-2.5-flash")
            .complete(&prompt)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
            .mount(&server)
            .await;

        let err = transport(&server, "gemini-2.5-flash")
            .complete(&prompts::poetry("春晓"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_missing_choices_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let err = transport(&server, "gemini-2.5-flash")
            .complete(&prompts::poetry("春晓"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid response format"));
    }
}
