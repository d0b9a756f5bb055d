//! Batch orchestration for analyze requests.
//!
//! Each requested CV id moves through Pending -> Skipped | Invoked ->
//! Scored | Failed, and every terminal state converges to exactly one
//! `CandidateScore` — the result list always has the same length and order
//! as the request's id list. Failures after request validation are isolated
//! per candidate; nothing aborts or retries the batch.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::budget::within_token_budget;
use crate::analysis::parser::{parse_candidate_fields, ScoreParseError, ScoredFields};
use crate::analysis::prompts::{build_analysis_prompt, format_job_profile, ANALYSIS_SYSTEM};
use crate::analysis::provider::{AnalysisProvider, ProviderError};
use crate::errors::AppError;
use crate::models::{AnalysisResult, CandidateScore, CvRecord, JobProfile};

/// Batch ceiling: more ids than this rejects the whole request up front.
pub const MAX_CVS_PER_ANALYSIS: usize = 20;

/// Request body of POST /analyze. `cv_data` carries the records the client
/// received from /upload — nothing is stored server-side between requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub job_profile: JobProfile,
    pub cv_ids: Vec<String>,
    #[serde(default)]
    pub cv_data: Vec<CvRecord>,
}

/// Why a candidate never reached the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    MissingData,
    OverBudget,
}

impl SkipReason {
    fn reasoning(self) -> &'static str {
        match self {
            SkipReason::MissingData => "CV data not found",
            SkipReason::OverBudget => "CV content too large for analysis",
        }
    }

    fn weakness(self) -> &'static str {
        match self {
            SkipReason::MissingData => "CV content was not provided",
            SkipReason::OverBudget => "Content exceeds token limits",
        }
    }

    fn recommendation(self) -> &'static str {
        match self {
            SkipReason::MissingData => "Please upload the CV again",
            SkipReason::OverBudget => "Please provide a shorter CV",
        }
    }
}

/// Terminal state of one candidate. Mapped 1:1 onto a `CandidateScore`.
#[derive(Debug)]
enum CandidateOutcome {
    Skipped(SkipReason),
    Scored(ScoredFields),
    Failed,
}

/// Failure inside the Invoked state — provider call or reply parsing.
#[derive(Debug, Error)]
enum CandidateError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Parse(#[from] ScoreParseError),
}

/// Request-shape validation. A failure here aborts the whole request with no
/// per-candidate work and no provider calls.
pub fn validate_request(request: &AnalysisRequest) -> Result<(), AppError> {
    if request.cv_ids.is_empty() {
        return Err(AppError::Validation(
            "Invalid request: job profile and CV IDs are required".to_string(),
        ));
    }
    if request.cv_ids.len() > MAX_CVS_PER_ANALYSIS {
        return Err(AppError::Validation(format!(
            "Maximum {MAX_CVS_PER_ANALYSIS} CVs allowed per analysis"
        )));
    }
    Ok(())
}

/// Runs the full batch: per-candidate resolve -> budget gate -> invoke ->
/// parse, sequentially in request order, then aggregates.
pub async fn run_batch(
    provider: &dyn AnalysisProvider,
    request: &AnalysisRequest,
) -> AnalysisResult {
    let profile_text = format_job_profile(&request.job_profile);
    let records: HashMap<&str, &CvRecord> = request
        .cv_data
        .iter()
        .map(|cv| (cv.id.as_str(), cv))
        .collect();

    let mut candidates = Vec::with_capacity(request.cv_ids.len());

    for cv_id in &request.cv_ids {
        let record = records.get(cv_id.as_str()).copied();
        let outcome = resolve_candidate(provider, &profile_text, record).await;
        candidates.push(into_score(cv_id, record, outcome));
    }

    let average_score = average_positive_score(&candidates);
    info!(
        "analysis batch complete: {} candidates, average score {}",
        candidates.len(),
        average_score
    );

    AnalysisResult {
        job_profile: request.job_profile.clone(),
        total_candidates: candidates.len(),
        average_score,
        candidates,
        analysis_date: chrono::Utc::now(),
    }
}

async fn resolve_candidate(
    provider: &dyn AnalysisProvider,
    profile_text: &str,
    record: Option<&CvRecord>,
) -> CandidateOutcome {
    let Some(cv) = record else {
        return CandidateOutcome::Skipped(SkipReason::MissingData);
    };

    // Hard pre-flight gate: over-budget pairs never reach the provider.
    let combined = format!("{profile_text}{}", cv.extracted_text);
    if !within_token_budget(&combined) {
        return CandidateOutcome::Skipped(SkipReason::OverBudget);
    }

    match analyze_candidate(provider, profile_text, cv).await {
        Ok(fields) => CandidateOutcome::Scored(fields),
        Err(e) => {
            warn!("analysis failed for CV {} ({}): {e}", cv.id, cv.filename);
            CandidateOutcome::Failed
        }
    }
}

async fn analyze_candidate(
    provider: &dyn AnalysisProvider,
    profile_text: &str,
    cv: &CvRecord,
) -> Result<ScoredFields, CandidateError> {
    let prompt = build_analysis_prompt(profile_text, &cv.extracted_text, &cv.filename);
    let raw = provider.complete(ANALYSIS_SYSTEM, &prompt).await?;
    Ok(parse_candidate_fields(&raw)?)
}

/// Maps a terminal state to the single `CandidateScore` for that id.
fn into_score(cv_id: &str, record: Option<&CvRecord>, outcome: CandidateOutcome) -> CandidateScore {
    let filename = record
        .map(|cv| cv.filename.clone())
        .unwrap_or_else(|| format!("cv_{cv_id}"));

    match outcome {
        CandidateOutcome::Scored(fields) => CandidateScore {
            id: cv_id.to_string(),
            filename,
            overall_score: fields.overall_score,
            skill_matches: fields.skill_matches,
            experience_score: fields.experience_score,
            education_score: fields.education_score,
            reasoning: fields.reasoning,
            strengths: fields.strengths,
            weaknesses: fields.weaknesses,
            recommendations: fields.recommendations,
        },
        CandidateOutcome::Skipped(reason) => placeholder_score(
            cv_id,
            filename,
            reason.reasoning(),
            reason.weakness(),
            reason.recommendation(),
        ),
        CandidateOutcome::Failed => placeholder_score(
            cv_id,
            filename,
            "Analysis failed",
            "Analysis error occurred",
            "Please try again",
        ),
    }
}

fn placeholder_score(
    cv_id: &str,
    filename: String,
    reasoning: &str,
    weakness: &str,
    recommendation: &str,
) -> CandidateScore {
    CandidateScore {
        id: cv_id.to_string(),
        filename,
        overall_score: 0,
        skill_matches: vec![],
        experience_score: 0,
        education_score: 0,
        reasoning: reasoning.to_string(),
        strengths: vec![],
        weaknesses: vec![weakness.to_string()],
        recommendations: vec![recommendation.to_string()],
    }
}

/// Mean of strictly positive overall scores, rounded to nearest. Zero-score
/// candidates (failures, skips) are excluded from the mean but still count
/// toward the total. Returns 0 when no candidate scored positively.
fn average_positive_score(candidates: &[CandidateScore]) -> u8 {
    let positive: Vec<u32> = candidates
        .iter()
        .filter(|c| c.overall_score > 0)
        .map(|c| u32::from(c.overall_score))
        .collect();

    if positive.is_empty() {
        return 0;
    }

    let sum: u32 = positive.iter().sum();
    ((sum as f64 / positive.len() as f64).round()) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::budget::MAX_TOKENS_PER_REQUEST;
    use crate::models::ExperienceLevel;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Test double: returns a canned reply and counts invocations so tests
    /// can assert the budget/missing-data gates short-circuit.
    struct CannedProvider {
        reply: String,
        calls: AtomicUsize,
    }

    impl CannedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn complete(&self, _system: &str, _user: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    /// Test double that always fails at the transport boundary.
    struct FailingProvider;

    #[async_trait]
    impl AnalysisProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn complete(&self, _system: &str, _user: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Api {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    fn cv(id: &str, filename: &str, text: &str) -> CvRecord {
        CvRecord {
            id: id.to_string(),
            filename: filename.to_string(),
            extracted_text: text.to_string(),
            file_size: text.len(),
            upload_date: chrono::Utc::now(),
        }
    }

    fn request(cv_ids: &[&str], cv_data: Vec<CvRecord>) -> AnalysisRequest {
        AnalysisRequest {
            job_profile: JobProfile {
                title: "Sales Rep".to_string(),
                description: "Sells".to_string(),
                required_skills: vec!["Spanish".to_string()],
                experience_level: ExperienceLevel::Mid,
                ..Default::default()
            },
            cv_ids: cv_ids.iter().map(|s| s.to_string()).collect(),
            cv_data,
        }
    }

    const SCORED_REPLY: &str =
        r#"{"overallScore": 80, "experienceScore": 70, "educationScore": 60, "reasoning": "Good"}"#;

    #[test]
    fn test_validate_rejects_empty_id_list() {
        let req = request(&[], vec![]);
        assert!(matches!(
            validate_request(&req),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_batch() {
        let ids: Vec<String> = (0..21).map(|i| format!("cv-{i}")).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let req = request(&id_refs, vec![]);
        let err = validate_request(&req).unwrap_err();
        assert!(err.to_string().contains("Maximum 20"));
    }

    #[test]
    fn test_validate_accepts_full_batch() {
        let ids: Vec<String> = (0..20).map(|i| format!("cv-{i}")).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        assert!(validate_request(&request(&id_refs, vec![])).is_ok());
    }

    #[tokio::test]
    async fn test_result_length_and_order_match_request() {
        let provider = CannedProvider::new(SCORED_REPLY);
        let req = request(
            &["b", "a", "c"],
            vec![cv("a", "a.pdf", "text a"), cv("b", "b.pdf", "text b")],
        );

        let result = run_batch(&provider, &req).await;
        assert_eq!(result.total_candidates, 3);
        assert_eq!(result.candidates.len(), 3);
        let ids: Vec<&str> = result.candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_missing_record_is_skipped_with_not_found_reasoning() {
        let provider = CannedProvider::new(SCORED_REPLY);
        let req = request(&["a", "b"], vec![cv("a", "a.pdf", "short cv")]);

        let result = run_batch(&provider, &req).await;
        assert_eq!(result.candidates.len(), 2);

        let found = &result.candidates[0];
        assert_eq!(found.overall_score, 80);

        let missing = &result.candidates[1];
        assert_eq!(missing.overall_score, 0);
        assert!(missing.reasoning.contains("not found"));
        assert_eq!(missing.filename, "cv_b");
        // only the resolvable candidate reached the provider
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_over_budget_candidate_never_reaches_provider() {
        let provider = CannedProvider::new(SCORED_REPLY);
        let oversized = "x".repeat(MAX_TOKENS_PER_REQUEST * 4 + 1);
        let req = request(&["big"], vec![cv("big", "big.pdf", &oversized)]);

        let result = run_batch(&provider, &req).await;
        let candidate = &result.candidates[0];
        assert_eq!(candidate.overall_score, 0);
        assert!(candidate.reasoning.contains("too large"));
        assert_eq!(
            candidate.weaknesses,
            vec!["Content exceeds token limits".to_string()]
        );
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_downgrades_candidate_not_batch() {
        let provider = FailingProvider;
        let req = request(
            &["a", "b"],
            vec![cv("a", "a.pdf", "text"), cv("b", "b.pdf", "text")],
        );

        let result = run_batch(&provider, &req).await;
        assert_eq!(result.candidates.len(), 2);
        for candidate in &result.candidates {
            assert_eq!(candidate.overall_score, 0);
            assert_eq!(candidate.reasoning, "Analysis failed");
            assert_eq!(
                candidate.weaknesses,
                vec!["Analysis error occurred".to_string()]
            );
            assert_eq!(
                candidate.recommendations,
                vec!["Please try again".to_string()]
            );
        }
        assert_eq!(result.average_score, 0);
    }

    #[tokio::test]
    async fn test_unparseable_reply_downgrades_candidate() {
        let provider = CannedProvider::new("I refuse to answer in JSON.");
        let req = request(&["a"], vec![cv("a", "a.pdf", "text")]);

        let result = run_batch(&provider, &req).await;
        assert_eq!(result.candidates[0].overall_score, 0);
        assert_eq!(result.candidates[0].reasoning, "Analysis failed");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_average_excludes_zero_scores() {
        let provider = CannedProvider::new(SCORED_REPLY);
        // "a" scores 80, "missing" scores 0 and must not drag the mean down
        let req = request(&["a", "missing"], vec![cv("a", "a.pdf", "text")]);

        let result = run_batch(&provider, &req).await;
        assert_eq!(result.average_score, 80);
        assert_eq!(result.total_candidates, 2);
    }

    #[test]
    fn test_average_rounds_to_nearest() {
        let scores = [81, 80];
        let candidates: Vec<CandidateScore> = scores
            .iter()
            .map(|&s| {
                let mut c = placeholder_score("id", "f".to_string(), "r", "w", "rec");
                c.overall_score = s;
                c
            })
            .collect();
        // mean 80.5 rounds to 81 (round half away from zero)
        assert_eq!(average_positive_score(&candidates), 81);
    }

    #[test]
    fn test_average_is_zero_when_no_positive_scores() {
        let candidates = vec![placeholder_score("id", "f".to_string(), "r", "w", "rec")];
        assert_eq!(average_positive_score(&candidates), 0);
    }

    #[tokio::test]
    async fn test_analysis_request_wire_format() {
        let req: AnalysisRequest = serde_json::from_str(
            r#"{
                "jobProfile": {"title": "Sales Rep", "requiredSkills": ["Spanish"]},
                "cvIds": ["a", "b"]
            }"#,
        )
        .unwrap();
        assert_eq!(req.cv_ids, vec!["a", "b"]);
        assert!(req.cv_data.is_empty());
        assert_eq!(req.job_profile.title, "Sales Rep");
    }
}
