//! Job-description parsing — turns pasted job-ad text into a structured
//! profile via the configured analysis provider.

pub mod handlers;
pub mod prompts;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::parser::{extract_json_object, string_field, string_list};
use crate::analysis::provider::{AnalysisProvider, ProviderError};
use crate::jobparse::prompts::{build_parse_prompt, system_prompt};
use crate::models::ExperienceLevel;

/// Job-ad text beyond this is rejected before any LLM call.
pub const MAX_JOB_TEXT_LENGTH: usize = 10_000;

/// Prompt language for /parse-job. Defaults to Spanish, which the product
/// originally shipped with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Es,
}

impl Language {
    fn fallback_title(self) -> &'static str {
        match self {
            Language::En => "Untitled role",
            Language::Es => "Sin título",
        }
    }
}

/// Structured output of /parse-job: the JobProfile fields plus the
/// richer sections a job ad usually carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedJobData {
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub education: Vec<String>,
    pub experience_level: ExperienceLevel,
    pub industry: String,
    pub location: String,
    pub responsibilities: Vec<String>,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
}

/// Parses a job description through the provider and cleans the reply field
/// by field. Provider and JSON failures propagate; the caller maps them to
/// HTTP errors (there is no per-candidate downgrade on this path).
pub async fn parse_job_description(
    provider: &dyn AnalysisProvider,
    job_text: &str,
    language: Language,
) -> Result<ParsedJobData, ParseJobError> {
    let raw = provider
        .complete(system_prompt(language), &build_parse_prompt(job_text))
        .await?;

    let value = extract_json_object(&raw).map_err(|e| ParseJobError::Malformed(e.to_string()))?;
    Ok(clean_parsed_job(&value, job_text, language))
}

#[derive(Debug, thiserror::Error)]
pub enum ParseJobError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("model reply was not a usable JSON object: {0}")]
    Malformed(String),
}

/// Per-field tolerant cleaning. Missing or wrong-shaped fields get safe
/// defaults; the description falls back to the original job text so the
/// caller never loses what it submitted.
fn clean_parsed_job(value: &Value, job_text: &str, language: Language) -> ParsedJobData {
    let title = string_field(value, "title");
    let description = string_field(value, "description");

    ParsedJobData {
        title: if title.trim().is_empty() {
            language.fallback_title().to_string()
        } else {
            title
        },
        description: if description.trim().is_empty() {
            job_text.to_string()
        } else {
            description
        },
        required_skills: string_list(value, "requiredSkills"),
        preferred_skills: string_list(value, "preferredSkills"),
        education: string_list(value, "education"),
        experience_level: value
            .get("experienceLevel")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default(),
        industry: string_field(value, "industry"),
        location: string_field(value, "location"),
        responsibilities: string_list(value, "responsibilities"),
        requirements: string_list(value, "requirements"),
        benefits: string_list(value, "benefits"),
    }
}
