//! Tolerant extraction of a score object from free-form model text.
//!
//! The model's reply is not guaranteed to be bare JSON — some vendors wrap
//! the object in prose or code fences. The parser locates the first
//! `{`-to-last-`}` span, falls back to the whole text, and then defaults
//! every expected field independently so a partially conforming reply still
//! yields a usable score. A reply with no decodable JSON at all is a
//! `ScoreParseError`; the batch orchestrator downgrades that candidate
//! rather than aborting.

use serde_json::Value;
use thiserror::Error;

use crate::models::SkillMatch;

pub const DEFAULT_REASONING: &str = "No reasoning provided";

#[derive(Debug, Error)]
pub enum ScoreParseError {
    #[error("model reply contained no decodable JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("model reply decoded to a non-object JSON value")]
    NotAnObject,
}

/// Score fields recovered from one model reply. Identity fields (CV id,
/// filename) are attached by the orchestrator, not parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFields {
    pub overall_score: u8,
    pub skill_matches: Vec<SkillMatch>,
    pub experience_score: u8,
    pub education_score: u8,
    pub reasoning: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Decodes a JSON object from `raw`, preferring the first balanced-looking
/// `{...}` span and falling back to the whole text.
pub fn extract_json_object(raw: &str) -> Result<Value, ScoreParseError> {
    if let Some(span) = brace_span(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            return require_object(value);
        }
    }
    require_object(serde_json::from_str::<Value>(raw.trim())?)
}

/// Parses one model reply into score fields, applying per-field defaults:
/// numbers default to 0 (and clamp to 0..=100), lists to empty, reasoning to
/// a documented placeholder.
pub fn parse_candidate_fields(raw: &str) -> Result<ScoredFields, ScoreParseError> {
    let value = extract_json_object(raw)?;

    Ok(ScoredFields {
        overall_score: score_field(&value, "overallScore"),
        skill_matches: skill_matches(&value),
        experience_score: score_field(&value, "experienceScore"),
        education_score: score_field(&value, "educationScore"),
        reasoning: value
            .get("reasoning")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_REASONING)
            .to_string(),
        strengths: string_list(&value, "strengths"),
        weaknesses: string_list(&value, "weaknesses"),
        recommendations: string_list(&value, "recommendations"),
    })
}

/// Greedy first-`{`-to-last-`}` span. Good enough for a single top-level
/// object wrapped in prose.
fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn require_object(value: Value) -> Result<Value, ScoreParseError> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(ScoreParseError::NotAnObject)
    }
}

/// Reads a 0-100 score, accepting integers or floats, clamping out-of-range
/// values and defaulting anything missing or non-numeric to 0.
fn score_field(value: &Value, key: &str) -> u8 {
    clamp_score(value.get(key))
}

fn clamp_score(value: Option<&Value>) -> u8 {
    match value.and_then(Value::as_f64) {
        Some(n) if n.is_finite() => n.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

/// Reads a list of strings, dropping non-string entries. Missing or
/// wrong-shaped fields default to empty.
pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Reads a string field, defaulting to empty when missing or wrong-shaped.
pub(crate) fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Skill-match entries are defaulted per field; non-object entries are
/// dropped rather than failing the whole list.
fn skill_matches(value: &Value) -> Vec<SkillMatch> {
    value
        .get("skillMatches")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| item.is_object())
                .map(|item| SkillMatch {
                    skill: string_field(item, "skill"),
                    confidence: clamp_score(item.get("confidence")),
                    found: item.get("found").and_then(Value::as_bool).unwrap_or(false),
                    context: item
                        .get("context")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default()
}
