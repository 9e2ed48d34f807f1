//! The seam between the gateway and whatever performs the actual extraction.
//!
//! Handlers only ever see [`ScrapeCollaborator`]; the shipped implementation is
//! [`crate::scraper::SmartScraper`]. The collaborator runs on the server's own
//! Tokio runtime, so implementations must not start or block on a runtime of
//! their own.

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// Model handed to the collaborator for every job, as `provider/model`.
pub const SCRAPER_MODEL: &str = "openai/gpt-4o-mini";

/// Structured output of one extraction.
pub type ScrapeResult = Map<String, Value>;

#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    pub llm: LlmConfig,
    /// Promotes per-stage collaborator logs from `debug` to `info`.
    pub verbose: bool,
    /// Whether page loads must happen without a visible browser.
    pub headless: bool,
}

impl GraphConfig {
    /// Configuration used for every gateway request.
    pub fn for_api_key(api_key: impl Into<String>) -> Self {
        Self {
            llm: LlmConfig {
                api_key: api_key.into(),
                model: SCRAPER_MODEL.to_string(),
            },
            verbose: true,
            headless: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeJob {
    pub config: GraphConfig,
    pub prompt: String,
    pub source_url: String,
}

#[async_trait]
pub trait ScrapeCollaborator: Send + Sync {
    /// Run one extraction job to completion.
    async fn run(&self, job: &ScrapeJob) -> Result<ScrapeResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_config_uses_fixed_model_and_flags() {
        let config = GraphConfig::for_api_key("sk-test");
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
        assert!(config.verbose);
        assert!(config.headless);
    }

    #[test]
    fn debug_output_hides_the_key() {
        let rendered = format!("{:?}", GraphConfig::for_api_key("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
