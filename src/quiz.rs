//! Request-independent quiz rules: listing limits, question payload checks,
//! answer grading and comment validation. Nothing here touches the store.

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::{NewQuestion, Question};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
pub const NO_EXPLANATION: &str = "No explanation available";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(msg: impl Into<String>) -> Self { Self(msg.into()) }
}

/// Absent or non-numeric -> default, anything else clamped to `[1, MAX_LIMIT]`.
pub fn clamp_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|n| n.clamp(1, MAX_LIMIT))
        .unwrap_or(DEFAULT_LIMIT)
}

/// The `is_ruf` request header: missing means true, otherwise only a
/// case-insensitive "true" counts.
pub fn parse_is_ruf(header: Option<&str>) -> bool {
    header.map_or(true, |v| v.trim().eq_ignore_ascii_case("true"))
}

/// A create/upsert body is one question object or an array of them.
#[derive(Debug)]
pub enum QuestionPayload {
    Single(Value),
    Batch(Vec<Value>),
}

impl QuestionPayload {
    pub fn from_json(body: Value) -> Result<Self, ValidationError> {
        match body {
            Value::Array(items) => Ok(Self::Batch(items)),
            obj @ Value::Object(_) => Ok(Self::Single(obj)),
            _ => Err(ValidationError::new("request body must be a question object or an array of questions")),
        }
    }
}

/// Decode one payload element into the inbound question shape and check the
/// required fields.
pub fn decode_question(value: Value) -> Result<NewQuestion, ValidationError> {
    let q: NewQuestion = serde_json::from_value(value)
        .map_err(|e| ValidationError::new(format!("invalid question: {e}")))?;
    validate_question(&q)?;
    Ok(q)
}

pub fn validate_question(q: &NewQuestion) -> Result<(), ValidationError> {
    for (name, value) in [("question_text", &q.question_text), ("subject", &q.subject), ("topic", &q.topic)] {
        if value.trim().is_empty() {
            return Err(ValidationError::new(format!("{name} is required")));
        }
    }
    if q.options.is_empty() {
        return Err(ValidationError::new("at least one option is required"));
    }
    if let Some(i) = q.options.iter().position(|o| o.text.trim().is_empty()) {
        return Err(ValidationError::new(format!("option {i} has no text")));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Grade {
    pub is_correct: bool,
    pub explanation: String,
    pub correct_answer: String,
}

/// Grade a selected option. Fails on an index outside `options` and on a
/// question with no option flagged correct.
pub fn grade(question: &Question, selected: i64) -> Result<Grade, ValidationError> {
    let chosen = usize::try_from(selected)
        .ok()
        .and_then(|i| question.options.get(i))
        .ok_or_else(|| ValidationError::new(format!(
            "selected_option_index {selected} is out of range (question has {} options)",
            question.options.len()
        )))?;
    let correct = question.options.iter()
        .find(|o| o.is_correct)
        .ok_or_else(|| ValidationError::new("question has no correct option"))?;
    Ok(Grade {
        is_correct: chosen.is_correct,
        explanation: question.explanation.clone()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| NO_EXPLANATION.to_string()),
        correct_answer: correct.text.clone(),
    })
}

pub fn validate_comment(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::new("Comment required"));
    }
    Ok(())
}
