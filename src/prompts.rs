//! Prompt builders, one per content type.
//!
//! Templates live under `data/prompts/` and use `{{key}}` placeholders.

use crate::models::GradeLevel;
use crate::schema::{self, Schema};

pub const READING: &str = include_str!("../data/prompts/reading.txt");
pub const POETRY: &str = include_str!("../data/prompts/poetry.txt");
pub const CHARACTER: &str = include_str!("../data/prompts/character.txt");
pub const COMPOSITION_IMAGE: &str = include_str!("../data/prompts/composition_image.txt");
pub const COMPOSITION_GUIDE: &str = include_str!("../data/prompts/composition_guide.txt");
pub const EVALUATION: &str = include_str!("../data/prompts/evaluation.txt");

const DEFAULT_READING_TOPIC: &str = "适合儿童的有趣话题（如动物、童话、校园生活、自然科学）";

/// A single request for a transport: the instruction text, the schema the
/// reply must satisfy (which also switches the transport into JSON mode), and
/// an optional image attachment as a data-URI.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub instruction: String,
    pub schema: Option<&'static Schema>,
    pub attachment: Option<String>,
}

impl Prompt {
    pub fn json(instruction: String, schema: &'static Schema) -> Self {
        Self {
            instruction,
            schema: Some(schema),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, data_uri: String) -> Self {
        self.attachment = Some(data_uri);
        self
    }

    pub fn json_mode(&self) -> bool {
        self.schema.is_some()
    }
}

/// Replace `{{key}}` placeholders in a template string.
///
/// Single pass over the template: substituted values are never scanned again,
/// and unknown placeholders are left as they are.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            result.push_str(&rest[start..]);
            return result;
        };

        match vars.iter().find(|(key, _)| *key == &after[..end]) {
            Some((_, value)) => {
                result.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                result.push_str("{{");
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

pub fn reading(grade: GradeLevel, topic: &str) -> Prompt {
    let topic = match topic.trim() {
        "" => DEFAULT_READING_TOPIC,
        topic => topic,
    };
    Prompt::json(
        render(READING, &[("grade", grade.label()), ("topic", topic)]),
        &schema::READING,
    )
}

pub fn poetry(query: &str) -> Prompt {
    Prompt::json(
        render(POETRY, &[("query", query.trim())]),
        &schema::POETRY,
    )
}

pub fn character(character: &str) -> Prompt {
    Prompt::json(
        render(CHARACTER, &[("char", character.trim())]),
        &schema::CHARACTER,
    )
}

/// Image-generation instruction for a picture-composition topic.
pub fn composition_image(topic: &str) -> String {
    render(COMPOSITION_IMAGE, &[("topic", topic)])
}

pub fn composition_guide(topic: &str, image: Option<&str>) -> Prompt {
    let prompt = Prompt::json(
        render(COMPOSITION_GUIDE, &[("topic", topic)]),
        &schema::COMPOSITION_GUIDE,
    );
    match image {
        Some(data_uri) => prompt.with_attachment(data_uri.to_string()),
        None => prompt,
    }
}

pub fn evaluation(student_text: &str, topic: &str) -> Prompt {
    Prompt::json(
        render(EVALUATION, &[("topic", topic), ("text", student_text)]),
        &schema::EVALUATION,
    )
}
