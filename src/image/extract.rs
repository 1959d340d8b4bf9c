//! Image extraction from raw generation output.
//!
//! Backends return pictures in many shapes. The checks below run in order and
//! the first hit wins; every result is directly renderable.

use crate::ai::mime;
use crate::normalize::strip_fences;
use base64::Engine as _;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

const MIN_BASE64_LEN: usize = 100;

static MARKDOWN_DATA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[[^\]]*\]\((data:image/[^;]+;base64,[^)\s]+)\)").expect("valid regex")
});

static URL_IN_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s)\]"'<>]+"#).expect("valid regex"));

pub fn extract_image_url(raw: &str) -> Option<String> {
    let content = raw.trim();
    if content.is_empty() {
        return None;
    }

    if let Some(url) = MARKDOWN_DATA_URI
        .captures(content)
        .and_then(|captures| renderable(&captures[1]))
    {
        tracing::debug!("Found data-URI in markdown image");
        return Some(url);
    }

    if let Some(url) = is_bare_url(content).then(|| renderable(content)).flatten() {
        return Some(url);
    }

    if content.starts_with("data:image/") {
        if let Some(url) = content.split_whitespace().next().and_then(renderable) {
            return Some(url);
        }
    }

    if let Some(url) = from_json_object(content) {
        tracing::debug!("Found image in JSON object");
        return Some(url);
    }

    if let Some(url) = URL_IN_TEXT
        .find(content)
        .and_then(|found| renderable(found.as_str()))
    {
        tracing::debug!("Extracted URL from text: {}", url);
        return Some(url);
    }

    from_bare_base64(content)
}

/// Accept only what an `<img>` can show as-is: an http(s) URL or a base64
/// `data:image/...` URI whose payload decodes.
fn renderable(candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() || candidate.contains(char::is_whitespace) {
        return None;
    }

    let remote = ["http://", "https://"].iter().any(|scheme| {
        candidate
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
            && candidate.len() > scheme.len()
    });
    if remote {
        return Some(candidate.to_string());
    }

    match mime::split_data_uri(candidate) {
        Some((mime_type, data)) if mime_type.starts_with("image/") && decode(data).is_some() => {
            Some(candidate.to_string())
        }
        _ => None,
    }
}

fn decode(data: &str) -> Option<Vec<u8>> {
    if data.is_empty() {
        return None;
    }
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(data))
        .ok()
}

fn is_bare_url(content: &str) -> bool {
    (content.starts_with("http://") || content.starts_with("https://"))
        && !content.contains(char::is_whitespace)
}

fn from_json_object(content: &str) -> Option<String> {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(strip_fences(content)) else {
        return None;
    };

    let url_field = |key: &str| match object.get(key) {
        Some(Value::String(url)) => renderable(url),
        Some(Value::Object(nested)) => nested
            .get("url")
            .and_then(Value::as_str)
            .and_then(renderable),
        _ => None,
    };

    if let Some(url) = url_field("url").or_else(|| url_field("image_url")) {
        return Some(url);
    }

    let data = object.get("data").and_then(Value::as_str)?.trim();
    if data.starts_with("data:") {
        return renderable(data);
    }
    wrap_base64(data)
}

fn from_bare_base64(content: &str) -> Option<String> {
    if content.len() <= MIN_BASE64_LEN || content.contains(char::is_whitespace) {
        return None;
    }
    wrap_base64(content)
}

/// Prefix a raw base64 image payload with a MIME type sniffed from its bytes.
fn wrap_base64(data: &str) -> Option<String> {
    if data.contains(char::is_whitespace) {
        return None;
    }
    let bytes = decode(data)?;
    let mime_type = mime::detect_image_mime(&bytes);
    tracing::debug!("Wrapped bare base64 payload as {}", mime_type);
    Some(mime::to_data_uri(mime_type, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markdown_data_uri() {
        assert_eq!(
            extract_image_url("![pic](data:image/png;base64,AAAA)").as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn test_markdown_data_uri_inside_prose() {
        assert_eq!(
            extract_image_url(
                "Here is your picture:\n![kite](data:image/jpeg;base64,/9j/4AAQ)\nEnjoy!"
            )
            .as_deref(),
            Some("data:image/jpeg;base64,/9j/4AAQ")
        );
    }

    #[test]
    fn test_bare_url() {
        assert_eq!(
            extract_image_url("  https://cdn.example.com/a.png \n").as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn test_data_uri_passthrough() {
        assert_eq!(
            extract_image_url("data:image/webp;base64,UklGRg==").as_deref(),
            Some("data:image/webp;base64,UklGRg==")
        );
    }

    #[test]
    fn test_json_object_fields() {
        assert_eq!(
            extract_image_url(r#"{"url":"https://x.example/1.png"}"#).as_deref(),
            Some("https://x.example/1.png")
        );
        assert_eq!(
            extract_image_url(r#"{"image_url":{"url":"https://x.example/2.png"}}"#).as_deref(),
            Some("https://x.example/2.png")
        );
        assert_eq!(
            extract_image_url(r#"{"data":"AAAA"}"#).as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn test_url_in_prose() {
        assert_eq!(
            extract_image_url(
                "I drew it for you: ![kite](https://x.example/kite.png) hope you like it"
            )
            .as_deref(),
            Some("https://x.example/kite.png")
        );
    }

    #[test]
    fn test_bare_base64_gets_sniffed_prefix() {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0];
        jpeg.extend(std::iter::repeat(0x11).take(120));
        let blob = base64::engine::general_purpose::STANDARD.encode(&jpeg);

        let url = extract_image_url(&blob).unwrap();
        assert_eq!(url, format!("data:image/jpeg;base64,{}", blob));
    }

    #[test]
    fn test_json_url_must_be_remote_or_data_uri() {
        assert_eq!(extract_image_url(r#"{"url":"kite.png"}"#), None);
        assert_eq!(extract_image_url(r#"{"image_url":{"url":"/tmp/kite.png"}}"#), None);
        assert_eq!(
            extract_image_url(r#"{"url":"data:image/png;base64,AAAA"}"#).as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn test_json_data_must_decode() {
        assert_eq!(extract_image_url(r#"{"data":"Sorry, I cannot draw."}"#), None);
        assert_eq!(extract_image_url(r#"{"data":"data:image/png;base64,???"}"#), None);

        let gif = base64::engine::general_purpose::STANDARD.encode(b"GIF89a\x01\x00");
        assert_eq!(
            extract_image_url(&format!(r#"{{"data":"{}"}}"#, gif)),
            Some(format!("data:image/gif;base64,{}", gif))
        );
    }

    #[test]
    fn test_data_uri_followed_by_prose_keeps_first_token() {
        assert_eq!(
            extract_image_url("data:image/png;base64,AAAA here is your picture").as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(extract_image_url("data:image/png;base64,!!!! sorry"), None);
    }

    #[test]
    fn test_nothing_to_extract() {
        assert_eq!(extract_image_url(""), None);
        assert_eq!(extract_image_url("Sorry, I cannot draw pictures."), None);
        assert_eq!(extract_image_url(&"not base64 ".repeat(20)), None);
    }
}
