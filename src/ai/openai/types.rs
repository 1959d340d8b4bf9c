//! OpenAI-compatible chat completion payloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: ChatMessageContent,
}

/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChatMessageContent {
    Text(String),
    Parts(Vec<MessagePart>),
}

#[derive(Debug, Serialize)]
pub struct MessagePart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<ImageUrl>,
}

impl MessagePart {
    pub fn text(text: String) -> Self {
        Self {
            part_type: "text".to_string(),
            text: Some(text),
            image_url: None,
        }
    }

    pub fn image(url: String) -> Self {
        Self {
            part_type: "image_url".to_string(),
            text: None,
            image_url: Some(ImageUrl { url }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

/// Assistant message as proxies actually send it: `content` may be a string,
/// an object, or null, and some proxies put generated images in `images`.
#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default)]
    pub images: Vec<ResponseImage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseImage {
    pub image_url: ImageUrl,
}

impl ChatCompletionResponse {
    /// Content of the first choice; non-string content comes back as JSON text.
    pub fn content(&self) -> Option<String> {
        let message = &self.choices.first()?.message;
        match &message.content {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) if text.trim().is_empty() => None,
            serde_json::Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn first_image(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .images
            .first()
            .map(|image| image.image_url.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(message: serde_json::Value) -> ChatCompletionResponse {
        serde_json::from_value(serde_json::json!({
            "choices": [{ "message": message, "finish_reason": "stop" }]
        }))
        .unwrap()
    }

    #[test]
    fn test_string_content() {
        let response = response(serde_json::json!({ "role": "assistant", "content": "hi" }));
        assert_eq!(response.content().as_deref(), Some("hi"));
    }

    #[test]
    fn test_object_content_becomes_json_text() {
        let response = response(serde_json::json!({
            "role": "assistant",
            "content": { "url": "https://x.example/a.png" }
        }));
        assert_eq!(
            response.content().as_deref(),
            Some(r#"{"url":"https://x.example/a.png"}"#)
        );
    }

    #[test]
    fn test_null_content_with_images() {
        let response = response(serde_json::json!({
            "role": "assistant",
            "content": null,
            "images": [{ "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } }]
        }));
        assert!(response.content().is_none());
        assert_eq!(response.first_image(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_multipart_message_serialization() {
        let message = ChatMessage {
            role: "user".to_string(),
            content: ChatMessageContent::Parts(vec![
                MessagePart::text("describe".to_string()),
                MessagePart::image("data:image/png;base64,AAAA".to_string()),
            ]),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            serde_json::json!({
                "role": "user",
                "content": [
                    { "type": "text", "text": "describe" },
                    { "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } }
                ]
            })
        );
    }
}
