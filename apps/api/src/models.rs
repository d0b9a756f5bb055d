//! Wire-format data model shared by the upload and analysis flows.
//!
//! Everything here is request-scoped: CV records are returned to the client
//! at upload time and sent back verbatim with the analyze request. Nothing
//! is persisted server-side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Extracted CV text is capped at this many characters. Oversized text is
/// truncated at upload time, never rejected.
pub const MAX_TEXT_LENGTH: usize = 50_000;

/// Seniority band of the role being hired for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    #[default]
    Mid,
    Senior,
    Lead,
}

/// Structured description of the role used as the comparison baseline.
/// Immutable once submitted for an analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProfile {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub location: String,
}

/// One uploaded CV reduced to plain text. Created by the upload flow, held
/// by the client for the session, referenced by id in analyze requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvRecord {
    pub id: String,
    pub filename: String,
    pub extracted_text: String,
    pub file_size: usize,
    pub upload_date: DateTime<Utc>,
}

impl CvRecord {
    /// Builds a fresh record with a generated id and the current timestamp.
    /// `extracted_text` is expected to already be truncated by the extractor.
    pub fn new(filename: String, extracted_text: String, file_size: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename,
            extracted_text,
            file_size,
            upload_date: Utc::now(),
        }
    }
}

/// A single skill the model looked for in the CV. Produced only by the
/// external model, never hand-computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMatch {
    pub skill: String,
    pub confidence: u8,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Per-candidate scoring record. Exactly one is produced for every CV id in
/// an analyze request, including ids that were skipped or failed — those get
/// zero scores and a diagnostic reasoning string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateScore {
    pub id: String,
    pub filename: String,
    pub overall_score: u8,
    pub skill_matches: Vec<SkillMatch>,
    pub experience_score: u8,
    pub education_score: u8,
    pub reasoning: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Full batch result. Candidate order equals request order; ranking is a
/// client concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub job_profile: JobProfile,
    pub candidates: Vec<CandidateScore>,
    pub analysis_date: DateTime<Utc>,
    pub total_candidates: usize,
    pub average_score: u8,
}

/// Response body of POST /upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub files: Vec<CvRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}
