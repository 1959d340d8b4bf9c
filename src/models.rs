//! Data models and structures
//!
//! Defines the typed requests accepted by the gateway and the strict result
//! records handed to the UI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeLevel {
    #[serde(rename = "一年级")]
    One,
    #[serde(rename = "二年级")]
    Two,
    #[serde(rename = "三年级")]
    Three,
    #[serde(rename = "四年级")]
    Four,
    #[serde(rename = "五年级")]
    Five,
    #[serde(rename = "六年级")]
    Six,
}

impl GradeLevel {
    pub const ALL: [GradeLevel; 6] = [
        GradeLevel::One,
        GradeLevel::Two,
        GradeLevel::Three,
        GradeLevel::Four,
        GradeLevel::Five,
        GradeLevel::Six,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GradeLevel::One => "一年级",
            GradeLevel::Two => "二年级",
            GradeLevel::Three => "三年级",
            GradeLevel::Four => "四年级",
            GradeLevel::Five => "五年级",
            GradeLevel::Six => "六年级",
        }
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GradeLevel {
    type Err = String;

    /// Accepts `1`..`6` or the Chinese label (`三年级`).
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if let Ok(n) = input.parse::<usize>() {
            if (1..=6).contains(&n) {
                return Ok(Self::ALL[n - 1]);
            }
        }
        Self::ALL
            .into_iter()
            .find(|grade| grade.label() == input)
            .ok_or_else(|| format!("Invalid grade '{}'. Expected 1-6 or 一年级..六年级", input))
    }
}

/// One gateway request; each variant has exactly one prompt builder and schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRequest {
    Reading { grade: GradeLevel, topic: String },
    Poetry { query: String },
    Character { character: String },
    CompositionGeneration { topic: Option<String> },
    CompositionEvaluation { student_text: String, topic: String },
}

impl ContentRequest {
    pub fn operation(&self) -> Operation {
        match self {
            ContentRequest::Reading { .. } => Operation::Reading,
            ContentRequest::Poetry { .. } => Operation::Poetry,
            ContentRequest::Character { .. } => Operation::Character,
            ContentRequest::CompositionGeneration { .. } => Operation::Composition,
            ContentRequest::CompositionEvaluation { .. } => Operation::Evaluation,
        }
    }
}

/// The user-facing operations; the label titles failure notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Reading,
    Poetry,
    Character,
    Composition,
    Evaluation,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Reading => "阅读理解生成",
            Operation::Poetry => "古诗生成",
            Operation::Character => "汉字解析",
            Operation::Composition => "看图写话生成",
            Operation::Evaluation => "作文批改",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingArticle {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub content: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poem {
    pub title: String,
    pub author: String,
    pub dynasty: String,
    pub content: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinyin: Option<Vec<String>>,
    pub translation: String,
    pub analysis: String,
    pub tags: Vec<String>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterData {
    #[serde(rename = "char")]
    pub character: String,
    pub pinyin: String,
    pub radical: String,
    pub strokes: i64,
    pub definition: String,
    pub etymology: String,
    pub vocabulary: Vec<String>,
    pub common_phrases: Vec<String>,
}

/// Observation hints for a picture-composition exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionTips {
    pub time: String,
    pub location: String,
    pub characters: String,
    pub event: String,
}

/// Text half of a composition task, as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionGuide {
    pub tips: CompositionTips,
    pub vocabulary: Vec<String>,
    pub sample_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCompositionData {
    pub image_url: String,
    pub topic: String,
    pub is_model_generated: bool,
    pub tips: CompositionTips,
    pub vocabulary: Vec<String>,
    pub sample_text: String,
}

impl ImageCompositionData {
    pub fn new(image: ImageResolution, topic: String, guide: CompositionGuide) -> Self {
        Self {
            image_url: image.url,
            topic,
            is_model_generated: image.is_model_generated,
            tips: guide.tips,
            vocabulary: guide.vocabulary,
            sample_text: guide.sample_text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionEvaluation {
    pub score: i64,
    pub comment: String,
    pub good_points: Vec<String>,
    pub suggestions: Vec<String>,
}

/// A directly renderable illustration (http(s) URL or data-URI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResolution {
    pub url: String,
    pub is_model_generated: bool,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NormalizedResult {
    Reading(ReadingArticle),
    Poetry(Poem),
    Character(CharacterData),
    Composition(ImageCompositionData),
    Evaluation(CompositionEvaluation),
}
