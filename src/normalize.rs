//! Response normalization
//!
//! Turns raw backend text into a value that satisfies a [`Schema`]. The
//! pipeline runs in stages:
//!
//! 1. strip code fences and parse JSON (salvaging an object embedded in prose),
//! 2. resolve alternate key names when the canonical key is absent,
//! 3. coerce each field to its declared shape,
//! 4. turn letter answers into option indices,
//! 5. strip enumeration labels from options,
//! 6. fill absent fields from their documented fallbacks,
//! 7. assert required fields and element counts.
//!
//! Only stage 1 (`MalformedOutput`) and stages 6/7 for required content
//! (`SchemaViolation`) can fail. The output only carries schema fields, so
//! canonical input passes through unchanged.

use crate::prompts::render;
use crate::schema::{Fallback, Field, FieldKind, Schema};
use crate::{Error, Result};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::LazyLock;

const PARAGRAPH_BREAK: &str = "\n\n";

static OPTION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[A-Da-d]\s*[.．、:：)）]\s*").expect("valid option label regex")
});

/// Normalize `raw` into the typed record described by `schema`.
///
/// `vars` fills `{{key}}` placeholders in fallback text (for example the
/// requested character or topic).
pub fn normalize<T: DeserializeOwned>(
    raw: &str,
    schema: &Schema,
    vars: &[(&str, &str)],
) -> Result<T> {
    let value = normalize_value(raw, schema, vars)?;
    serde_json::from_value(value)
        .map_err(|e| Error::SchemaViolation(format!("{}: {}", schema.name, e)))
}

/// Normalize `raw` into a canonical JSON object for `schema`.
pub fn normalize_value(raw: &str, schema: &Schema, vars: &[(&str, &str)]) -> Result<Value> {
    let value = match parse_payload(raw)? {
        Value::Array(mut items) if items.len() == 1 => items.pop().unwrap_or_default(),
        value => value,
    };

    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(Error::SchemaViolation(format!(
                "{} expects a JSON object, got {}",
                schema.name,
                type_name(&other)
            )))
        }
    };

    Ok(Value::Object(normalize_record(&object, schema, vars, 0)?))
}

/// Remove surrounding code-fence markers (with optional language tag) and whitespace.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.find('\n') {
            Some(newline) if rest[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
                &rest[newline + 1..]
            }
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }

    let text = text.trim();
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn parse_payload(raw: &str) -> Result<Value> {
    let text = strip_fences(raw);
    if text.is_empty() {
        return Err(Error::MalformedOutput("empty response".to_string()));
    }

    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(parse_error) => {
            let salvaged = extract_embedded_object(text)
                .and_then(|candidate| serde_json::from_str::<Value>(candidate).ok());
            match salvaged {
                Some(value) => {
                    tracing::debug!("Recovered JSON object embedded in surrounding prose");
                    Ok(value)
                }
                None => Err(Error::MalformedOutput(format!(
                    "response is not valid JSON: {}",
                    parse_error
                ))),
            }
        }
    }
}

/// Find the first balanced `{...}` slice, respecting string literals.
fn extract_embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn normalize_record(
    object: &Map<String, Value>,
    schema: &Schema,
    vars: &[(&str, &str)],
    position: usize,
) -> Result<Map<String, Value>> {
    let mut record = Map::new();

    for field in schema.fields {
        let coerced = match lookup(object, field) {
            Some(value) => coerce(value, field, &record, vars)?,
            None => None,
        };

        let value = match coerced {
            Some(value) => value,
            None => match fallback(field, vars, position) {
                Some(value) => value,
                None if matches!(field.fallback, Fallback::Omit) => continue,
                None => {
                    return Err(Error::SchemaViolation(format!(
                        "{}.{} is missing or has an unusable type",
                        schema.name, field.name
                    )))
                }
            },
        };

        record.insert(field.name.to_string(), value);
    }

    drop_blank_options(&mut record, schema)?;
    assert_shape(&record, schema)?;
    Ok(record)
}

/// Remove empty options and shift the answer index so it keeps pointing at the
/// same option text.
fn drop_blank_options(record: &mut Map<String, Value>, schema: &Schema) -> Result<()> {
    let Some(Value::Array(options)) = record.get("options") else {
        return Ok(());
    };
    if !options.iter().any(|option| option.as_str().is_some_and(str::is_empty)) {
        return Ok(());
    }

    let answer = schema
        .fields
        .iter()
        .find(|field| matches!(field.kind, FieldKind::AnswerIndex))
        .and_then(|field| {
            let index = record.get(field.name).and_then(Value::as_u64)?;
            Some((field.name, index as usize))
        });

    if let Some((name, index)) = answer {
        if options.get(index).and_then(Value::as_str).is_some_and(str::is_empty) {
            return Err(Error::SchemaViolation(format!(
                "{}.{} = {} points at a blank option",
                schema.name, name, index
            )));
        }
        let blanks_before = options
            .iter()
            .take(index)
            .filter(|option| option.as_str().is_some_and(str::is_empty))
            .count();
        tracing::warn!(
            "Dropping blank options from {}, answer index {} -> {}",
            schema.name,
            index,
            index - blanks_before
        );
        record.insert(name.to_string(), Value::from(index - blanks_before));
    }

    if let Some(Value::Array(options)) = record.get_mut("options") {
        options.retain(|option| !option.as_str().is_some_and(str::is_empty));
    }
    Ok(())
}

/// Canonical key first; aliases only when it is absent.
fn lookup<'a>(object: &'a Map<String, Value>, field: &Field) -> Option<&'a Value> {
    std::iter::once(field.name)
        .chain(field.aliases.iter().copied())
        .find_map(|key| object.get(key).filter(|value| !value.is_null()))
}

fn coerce(
    value: &Value,
    field: &Field,
    record: &Map<String, Value>,
    vars: &[(&str, &str)],
) -> Result<Option<Value>> {
    let coerced = match field.kind {
        FieldKind::Text => as_text(value).map(Value::String),
        FieldKind::TextList => as_list(value, false).map(string_array),
        FieldKind::Lines => as_list(value, true).map(string_array),
        FieldKind::Integer { min, max } => {
            as_integer(value).map(|n| Value::from(n.clamp(min, max)))
        }
        // Blank entries stay in place until the answer index is resolved.
        FieldKind::Options => match value {
            Value::Array(_) | Value::Object(_) => Some(string_array(
                elements(value)
                    .into_iter()
                    .map(|option| {
                        as_text(option).map_or_else(String::new, |text| strip_option_label(&text))
                    })
                    .collect(),
            )),
            _ => None,
        },
        FieldKind::AnswerIndex => {
            let option_count = record
                .get("options")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            Some(Value::from(answer_index(value, option_count)))
        }
        FieldKind::Record(schema) => match value {
            Value::Object(object) => {
                Some(Value::Object(normalize_record(object, schema, vars, 0)?))
            }
            _ => None,
        },
        FieldKind::Records(schema) => {
            let mut records = Vec::new();
            for (position, item) in elements(value).into_iter().enumerate() {
                match item {
                    Value::Object(object) => records.push(Value::Object(normalize_record(
                        object, schema, vars, position,
                    )?)),
                    other => tracing::warn!(
                        "Dropping {} entry of type {} from {}",
                        schema.name,
                        type_name(other),
                        field.name
                    ),
                }
            }
            match value {
                Value::Array(_) | Value::Object(_) => Some(Value::Array(records)),
                _ => None,
            }
        }
    };
    Ok(coerced)
}

fn fallback(field: &Field, vars: &[(&str, &str)], position: usize) -> Option<Value> {
    match field.fallback {
        Fallback::Required | Fallback::Omit => None,
        Fallback::Text(template) => Some(Value::String(render(template, vars))),
        Fallback::List(items) => Some(string_array(
            items.iter().map(|item| item.to_string()).collect(),
        )),
        Fallback::Integer(n) => Some(Value::from(n)),
        Fallback::Position => Some(Value::from(position)),
        Fallback::Record(pairs) => Some(Value::Object(
            pairs
                .iter()
                .map(|(key, template)| (key.to_string(), Value::String(render(template, vars))))
                .collect(),
        )),
    }
}

fn assert_shape(record: &Map<String, Value>, schema: &Schema) -> Result<()> {
    for field in schema.fields {
        let Some(value) = record.get(field.name) else {
            continue;
        };

        if let Some(items) = value.as_array() {
            let too_few = items.len() < field.min_items;
            let too_many = field.max_items.is_some_and(|max| items.len() > max);
            if too_few || too_many {
                return Err(Error::SchemaViolation(format!(
                    "{}.{} has {} items, expected {}..={}",
                    schema.name,
                    field.name,
                    items.len(),
                    field.min_items,
                    field
                        .max_items
                        .map_or_else(|| "∞".to_string(), |max| max.to_string())
                )));
            }
        }

        if matches!(field.kind, FieldKind::AnswerIndex) {
            let option_count = record
                .get("options")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            let index = value.as_u64().unwrap_or(u64::MAX);
            if index as usize >= option_count {
                return Err(Error::SchemaViolation(format!(
                    "{}.{} = {} is out of range for {} options",
                    schema.name, field.name, value, option_count
                )));
            }
        }
    }
    Ok(())
}

/// String view of any JSON value; empty strings count as absent.
fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => elements(value)
            .into_iter()
            .filter_map(as_text)
            .collect::<Vec<_>>()
            .join(PARAGRAPH_BREAK),
        Value::Null => return None,
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn as_list(value: &Value, split_lines: bool) -> Option<Vec<String>> {
    match value {
        Value::Array(_) | Value::Object(_) => {
            Some(elements(value).into_iter().filter_map(as_text).collect())
        }
        Value::String(s) if split_lines => Some(
            s.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
                .or_else(|| {
                    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
                    digits.parse().ok()
                })
        }
        _ => None,
    }
}

/// Resolve an answer to a zero-based option index.
///
/// Accepts integers, numeric strings and single uppercase letters (`"C"` is 2).
/// Anything unusable or out of range becomes 0.
pub fn answer_index(value: &Value, option_count: usize) -> usize {
    let candidate = match value {
        Value::String(s) => {
            let s = s.trim();
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(letter @ 'A'..='Z'), None) => Some(letter as i64 - 'A' as i64),
                _ => as_integer(value),
            }
        }
        _ => as_integer(value),
    };

    match candidate {
        Some(index) if index >= 0 && (index as usize) < option_count => index as usize,
        _ => {
            tracing::warn!(
                "Answer {} is not a valid index for {} options, defaulting to 0",
                value,
                option_count
            );
            0
        }
    }
}

/// Strip a leading enumeration label such as `"B. "` or `"C、"`.
pub fn strip_option_label(option: &str) -> String {
    OPTION_LABEL.replace(option, "").trim().to_string()
}

/// Arrays as-is, objects as their values in insertion order.
fn elements(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(object) => object.values().collect(),
        _ => Vec::new(),
    }
}

fn string_array(items: Vec<String>) -> Value {
    Value::Array(items.into_iter().map(Value::String).collect())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
