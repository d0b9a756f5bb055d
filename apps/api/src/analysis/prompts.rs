//! Prompt construction for CV analysis.
//!
//! The formatter is a pure function: identical profile input yields
//! byte-identical output. Tests depend on this, and so does prompt caching
//! on the vendor side.

use crate::models::{ExperienceLevel, JobProfile};

/// System prompt for candidate analysis. Describes the exact JSON schema the
/// model must return; the tolerant parser backfills anything it omits.
pub const ANALYSIS_SYSTEM: &str = r#"You are an expert HR recruiter and CV analyst. Your task is to evaluate a candidate's CV against a specific job profile and provide a detailed analysis with confidence scores.

Analysis Guidelines:
1. Evaluate skills match (0-100% confidence)
2. Assess experience relevance (0-100% confidence)
3. Check education requirements (0-100% confidence)
4. Provide overall fit score (0-100%)
5. List strengths and weaknesses
6. Give specific recommendations

Respond in JSON format with the following structure:
{
  "overallScore": number,
  "skillMatches": [
    {
      "skill": string,
      "confidence": number,
      "found": boolean,
      "context": string
    }
  ],
  "experienceScore": number,
  "educationScore": number,
  "reasoning": string,
  "strengths": [string],
  "weaknesses": [string],
  "recommendations": [string]
}"#;

const NONE_SPECIFIED: &str = "None specified";
const NOT_SPECIFIED: &str = "Not specified";

/// Renders a job profile as the deterministic text block embedded in every
/// analysis prompt. Empty lists render the "None specified" fallback rather
/// than an empty join; empty scalar fields render "Not specified".
pub fn format_job_profile(profile: &JobProfile) -> String {
    format!(
        "Job Title: {}\n\
         Description: {}\n\
         Required Skills: {}\n\
         Preferred Skills: {}\n\
         Education: {}\n\
         Experience Level: {}\n\
         Industry: {}\n\
         Location: {}",
        scalar_or_fallback(&profile.title),
        scalar_or_fallback(&profile.description),
        join_or_fallback(&profile.required_skills),
        join_or_fallback(&profile.preferred_skills),
        join_or_fallback(&profile.education),
        experience_level_label(profile.experience_level),
        scalar_or_fallback(&profile.industry),
        scalar_or_fallback(&profile.location),
    )
}

/// Combines the formatted job profile and a candidate's extracted CV text
/// into the user prompt for one analysis call.
pub fn build_analysis_prompt(profile_text: &str, cv_text: &str, candidate_name: &str) -> String {
    format!(
        "Job Profile:\n{profile_text}\n\n\
         Candidate CV ({candidate_name}):\n{cv_text}\n\n\
         Please analyze this candidate's fit for the position and provide your assessment in the specified JSON format."
    )
}

fn join_or_fallback(items: &[String]) -> String {
    if items.is_empty() {
        NONE_SPECIFIED.to_string()
    } else {
        items.join(", ")
    }
}

fn scalar_or_fallback(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_SPECIFIED
    } else {
        value
    }
}

fn experience_level_label(level: ExperienceLevel) -> &'static str {
    match level {
        ExperienceLevel::Entry => "entry",
        ExperienceLevel::Mid => "mid",
        ExperienceLevel::Senior => "senior",
        ExperienceLevel::Lead => "lead",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> JobProfile {
        JobProfile {
            title: "Sales Rep".to_string(),
            description: "Sell things".to_string(),
            required_skills: vec!["Spanish".to_string(), "CRM".to_string()],
            preferred_skills: vec![],
            education: vec!["High school".to_string()],
            experience_level: ExperienceLevel::Mid,
            industry: "Retail".to_string(),
            location: String::new(),
        }
    }

    #[test]
    fn test_format_job_profile_is_deterministic() {
        let profile = sample_profile();
        assert_eq!(format_job_profile(&profile), format_job_profile(&profile));
    }

    #[test]
    fn test_format_job_profile_joins_lists() {
        let text = format_job_profile(&sample_profile());
        assert!(text.contains("Required Skills: Spanish, CRM"));
        assert!(text.contains("Education: High school"));
        assert!(text.contains("Experience Level: mid"));
    }

    #[test]
    fn test_empty_list_renders_fallback_not_empty_join() {
        let text = format_job_profile(&sample_profile());
        assert!(text.contains("Preferred Skills: None specified"));
        assert!(!text.contains("Preferred Skills: \n"));
    }

    #[test]
    fn test_empty_scalar_renders_fallback() {
        let text = format_job_profile(&sample_profile());
        assert!(text.contains("Location: Not specified"));
    }

    #[test]
    fn test_analysis_prompt_embeds_profile_and_cv() {
        let prompt = build_analysis_prompt("PROFILE", "CV TEXT", "resume.pdf");
        assert!(prompt.starts_with("Job Profile:\nPROFILE"));
        assert!(prompt.contains("Candidate CV (resume.pdf):\nCV TEXT"));
        assert!(prompt.contains("specified JSON format"));
    }

    #[test]
    fn test_system_prompt_describes_schema() {
        assert!(ANALYSIS_SYSTEM.contains("\"overallScore\""));
        assert!(ANALYSIS_SYSTEM.contains("\"skillMatches\""));
        assert!(ANALYSIS_SYSTEM.contains("\"recommendations\""));
    }
}
