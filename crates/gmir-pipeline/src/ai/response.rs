//! Typed boundary for completion responses.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AiError;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\n?").expect("valid fence regex"));

/// One unvalidated item as returned by the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ReportItemDraft(pub Value);

impl ReportItemDraft {
    /// Raw value of `name`, or `None` when absent or when the draft is not an
    /// object.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.as_object().and_then(|obj| obj.get(name))
    }
}

/// `choices[0].message.content` of a chat completion.
///
/// Missing, `null` and empty content read as `"[]"`. Content of any other
/// JSON type (content-part arrays, objects, numbers) is rejected.
///
/// # Errors
///
/// Returns [`AiError::InvalidBody`] when `content` is present but not a string.
pub fn completion_content(body: &Value) -> Result<&str, AiError> {
    let content = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"));
    match content {
        None | Some(Value::Null) => Ok("[]"),
        Some(Value::String(s)) if s.is_empty() => Ok("[]"),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(AiError::InvalidBody(format!(
            "completion content is not a string: {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Removes markdown code fences anywhere in `content` and trims the result.
#[must_use]
pub fn strip_code_fences(content: &str) -> String {
    FENCE_RE.replace_all(content, "").trim().to_string()
}

/// Parses model output into drafts. The content must be a JSON array; any
/// other shape is an error.
///
/// # Errors
///
/// Returns [`AiError::Parse`] for invalid JSON and [`AiError::NotAnArray`]
/// for valid JSON of another shape.
pub fn parse_drafts(content: &str) -> Result<Vec<ReportItemDraft>, AiError> {
    let cleaned = strip_code_fences(content);
    match serde_json::from_str::<Value>(&cleaned)? {
        Value::Array(values) => Ok(values.into_iter().map(ReportItemDraft).collect()),
        _ => Err(AiError::NotAnArray),
    }
}
