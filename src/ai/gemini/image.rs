use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, ImageConfig, Part,
};
use super::GeminiTransport;
use crate::ai::mime;
use crate::{Error, Result};

impl GeminiTransport {
    /// Returns a data-URI when the model sent inline image data, otherwise
    /// whatever text it produced so the caller's extractor can look for a URL.
    pub(super) async fn render_image(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part::Text {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
                image_config: Some(ImageConfig {
                    aspect_ratio: "1:1".to_string(),
                }),
                ..Default::default()
            }),
        };

        let response: GenerateContentResponse = self.image.generate_content(&request).await?;

        if let Some(image) = response.inline_data() {
            tracing::debug!("Gemini returned image with mime_type: {}", image.mime_type);
            return Ok(mime::to_data_uri(&image.mime_type, &image.data));
        }

        response
            .text()
            .ok_or_else(|| Error::AiProvider("No image data in Gemini response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use crate::ai::Transport;
    use crate::Error;
    use wiremock::matchers::body_string_contains;
    use wiremock::{MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_image_returns_data_uri() {
        let server = MockServer::start().await;

        test_support::post_path_regex(r"^/v1beta/models/gemini-2\.5-flash-image:generateContent$")
            .and(body_string_contains("\"aspectRatio\":\"1:1\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [
                            { "text": "Here you go" },
                            { "inlineData": { "mimeType": "image/jpeg", "data": "/9j/4AAQ" } }
                        ]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = test_support::transport(&server, "gemini-2.5-flash");
        let image = transport.generate_image("a kite").await.unwrap();
        assert_eq!(image, "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[tokio::test]
    async fn test_generate_image_falls_back_to_text() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(test_support::text_response(
                "https://cdn.example.com/kite.png",
            )))
            .mount(&server)
            .await;

        let transport = test_support::transport(&server, "gemini-2.5-flash");
        let image = transport.generate_image("a kite").await.unwrap();
        assert_eq!(image, "https://cdn.example.com/kite.png");
    }

    #[tokio::test]
    async fn test_generate_image_rejects_empty_response() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .mount(&server)
            .await;

        let transport = test_support::transport(&server, "gemini-2.5-flash");
        let err = transport.generate_image("a kite").await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }
}
