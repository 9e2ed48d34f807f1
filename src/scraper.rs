use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::{Map, Value};

use crate::collaborator::{ScrapeCollaborator, ScrapeJob, ScrapeResult};
use crate::error::{AppError, Result};
use crate::llm::call_openai;

// Create static selectors to avoid recompiling them each time
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("body").expect("Failed to parse body selector")
});

const SYSTEM_PROMPT: &str = "You are a website scraper. You have just scraped the content of a webpage. \
Answer the user's question using only that content. \
Respond with a single JSON object and nothing else.";

/// Fetches the page, keeps its `<body>` and asks an OpenAI-compatible model for a JSON answer.
pub struct SmartScraper {
    client: Client,
    api_base: String,
}

/// Logs a pipeline stage at `info` when the job is verbose, `debug` otherwise.
macro_rules! stage {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

impl SmartScraper {
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }
}

#[async_trait]
impl ScrapeCollaborator for SmartScraper {
    async fn run(&self, job: &ScrapeJob) -> Result<ScrapeResult> {
        let verbose = job.config.verbose;
        let model = openai_model(&job.config.llm.model)?;

        stage!(verbose, source_url = %job.source_url, "fetching source page");
        let html = fetch_html(&self.client, &job.source_url).await?;

        let raw_body = extract_body(&html).ok_or_else(|| {
            AppError::CollaboratorFailure("No <body> tag found in the HTML".to_string())
        })?;
        let content = format_html(&raw_body);
        stage!(verbose, chars = content.len(), "extracted page content");

        let prompt = build_prompt(&job.prompt, &content);
        stage!(verbose, model = model, "calling LLM");
        let answer = call_openai(
            &self.client,
            &self.api_base,
            &job.config.llm.api_key,
            model,
            SYSTEM_PROMPT,
            &prompt,
        )
        .await?;
        stage!(verbose, chars = answer.len(), "LLM answered");

        parse_answer(&answer)
    }
}

/// Splits `provider/model` and rejects providers this collaborator cannot talk to.
fn openai_model(identifier: &str) -> Result<&str> {
    match identifier.split_once('/') {
        Some(("openai", model)) if !model.is_empty() => Ok(model),
        Some((provider, _)) => Err(AppError::CollaboratorFailure(format!(
            "Unsupported model provider: {}",
            provider
        ))),
        None => Ok(identifier),
    }
}

pub async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::CollaboratorFailure(format!("Failed to fetch {}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::CollaboratorFailure(format!(
            "Failed to fetch {}: status {}",
            url, status
        )));
    }

    response
        .text()
        .await
        .map_err(|e| AppError::CollaboratorFailure(format!("Failed to read {}: {}", url, e)))
}

pub fn extract_body(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    document.select(&BODY_SELECTOR)
        .next()
        .map(|element| element.inner_html())
}

pub fn format_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());

    for line in html.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str(trimmed);
        }
    }

    result
}

pub fn build_prompt(question: &str, content: &str) -> String {
    let mut result = String::with_capacity(question.len() + content.len() + 64);
    result.push_str("QUESTION: ");
    result.push_str(question);
    result.push_str("\n\nWEBSITE CONTENT:\n");
    result.push_str(content);
    result
}

/// Parses the model's reply into an object, wrapping bare values under `content`.
pub fn parse_answer(answer: &str) -> Result<ScrapeResult> {
    let text = strip_code_fence(answer.trim());
    let value: Value = serde_json::from_str(text).map_err(|e| {
        AppError::CollaboratorFailure(format!("LLM answer is not valid JSON: {}", e))
    })?;

    Ok(match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("content".to_string(), other);
            map
        }
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tracing::Level;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    #[derive(Clone, Default)]
    struct LevelRecorder(Arc<Mutex<Vec<Level>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LevelRecorder {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    #[test]
    fn verbose_promotes_stage_logs_to_info() {
        let recorder = LevelRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());

        tracing::subscriber::with_default(subscriber, || {
            stage!(true, chars = 1, "verbose stage");
            stage!(false, chars = 2, "quiet stage");
        });

        assert_eq!(*recorder.0.lock().unwrap(), vec![Level::INFO, Level::DEBUG]);
    }

    #[test]
    fn body_is_extracted_and_compacted() {
        let html = "<html><head><title>x</title></head><body>\n   <h1>Acme</h1>\n\n   <p>hello@acme.test</p>\n</body></html>";
        let body = extract_body(html).unwrap();
        assert_eq!(format_html(&body), "<h1>Acme</h1>\n<p>hello@acme.test</p>");
    }

    #[test]
    fn prompt_carries_question_and_content() {
        let prompt = build_prompt("Who are they?", "<p>Acme</p>");
        assert!(prompt.starts_with("QUESTION: Who are they?"));
        assert!(prompt.ends_with("<p>Acme</p>"));
    }

    #[test]
    fn object_answers_pass_through() {
        let parsed = parse_answer(r#"{"name": "Acme", "email": "hi@acme.test"}"#).unwrap();
        assert_eq!(Value::Object(parsed), json!({"name": "Acme", "email": "hi@acme.test"}));
    }

    #[test]
    fn fenced_answers_are_unwrapped() {
        let parsed = parse_answer("```json\n{\"name\": \"Acme\"}\n```").unwrap();
        assert_eq!(parsed["name"], "Acme");
    }

    #[test]
    fn bare_values_are_wrapped() {
        let parsed = parse_answer(r#"["a", "b"]"#).unwrap();
        assert_eq!(Value::Object(parsed), json!({"content": ["a", "b"]}));
    }

    #[test]
    fn prose_answers_are_rejected() {
        let err = parse_answer("The company sells anvils.").unwrap_err();
        assert!(matches!(err, AppError::CollaboratorFailure(_)));
    }

    #[test]
    fn model_identifier_is_split_by_provider() {
        assert_eq!(openai_model("openai/gpt-4o-mini").unwrap(), "gpt-4o-mini");
        assert_eq!(openai_model("gpt-4o-mini").unwrap(), "gpt-4o-mini");
        assert!(openai_model("ollama/llama3").is_err());
    }
}
