use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which analysis backend serves LLM calls. Selected explicitly via the
/// `ANALYSIS_PROVIDER` environment variable — there is no silent fallback
/// from a real provider to the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Perplexity,
    Mock,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "perplexity" => Ok(ProviderKind::Perplexity),
            "mock" => Ok(ProviderKind::Mock),
            other => bail!(
                "ANALYSIS_PROVIDER must be one of openai|anthropic|perplexity|mock, got '{other}'"
            ),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderKind,
    /// Vendor credentials are optional here; the selected provider enforces
    /// presence (and rejects placeholder values) before any network attempt.
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub perplexity_api_key: Option<String>,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            provider: std::env::var("ANALYSIS_PROVIDER")
                .unwrap_or_else(|_| "openai".to_string())
                .parse()?,
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            perplexity_api_key: std::env::var("PERPLEXITY_API_KEY").ok(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
