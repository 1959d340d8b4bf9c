use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use super::GeminiTransport;
use crate::ai::mime;
use crate::prompts::Prompt;
use crate::{Error, Result};

impl GeminiTransport {
    pub(super) async fn complete_text(&self, prompt: &Prompt) -> Result<String> {
        let mut parts = Vec::with_capacity(2);
        if let Some(attachment) = &prompt.attachment {
            match mime::split_data_uri(attachment) {
                Some((mime_type, data)) => parts.push(Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data: data.to_string(),
                    },
                }),
                None => tracing::warn!("Attachment is not a base64 data-URI, sending text only"),
            }
        }
        parts.push(Part::Text {
            text: prompt.instruction.clone(),
        });

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: prompt.schema.map(|schema| GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema.response_schema()),
                ..Default::default()
            }),
        };

        let response: GenerateContentResponse = self.text.generate_content(&request).await?;

        response.text().ok_or_else(|| {
            Error::AiProvider(format!(
                "No text in Gemini response (finish reason: {})",
                response.finish_reason().unwrap_or("unknown")
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use crate::ai::Transport;
    use crate::prompts;
    use crate::error::ErrorCategory;
    use crate::Error;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header};
    use wiremock::{MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_complete_sends_schema_and_returns_text() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": { "type": "OBJECT" }
                }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(test_support::text_response(r#"{"title":"静夜思"}"#)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = test_support::transport(&server, "gemini-2.5-flash");
        let text = transport.complete(&prompts::poetry("静夜思")).await.unwrap();
        assert_eq!(text, r#"{"title":"静夜思"}"#);
    }

    #[tokio::test]
    async fn test_complete_attaches_inline_image() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(body_partial_json(serde_json::json!({
                "contents": [{
                    "parts": [{ "inlineData": { "mimeType": "image/png", "data": "AAAA" } }]
                }]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(test_support::text_response("{}")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = test_support::transport(&server, "gemini-2.5-flash");
        let prompt = prompts::composition_guide("堆雪人", Some("data:image/png;base64,AAAA"));
        transport.complete(&prompt).await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let transport = test_support::transport(&server, "gemini-2.5-flash");
        let err = transport.complete(&prompts::character("森")).await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_empty_candidate_is_an_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "finishReason": "SAFETY" }]
            })))
            .mount(&server)
            .await;

        let transport = test_support::transport(&server, "gemini-2.5-flash");
        let err = transport.complete(&prompts::character("森")).await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_slow_response_is_a_timeout() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(test_support::text_response("{}"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let transport = test_support::transport(&server, "gemini-2.5-flash")
            .with_timeout(Duration::from_millis(50));
        let err = transport.complete(&prompts::character("森")).await.unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(err.category(), ErrorCategory::Timeout);
    }
}
