use serde::Serialize;
use reqwest::Client;
use crate::error::{Result, AppError};

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

/// Sends one JSON-mode chat completion and returns the assistant's raw text.
pub async fn call_openai(
    client: &Client,
    api_base: &str,
    api_key: &str,
    model: &str,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<String> {
    let body = ChatRequest {
        model,
        messages: vec![
            Message {
                role: "system",
                content: system_prompt,
            },
            Message {
                role: "user",
                content: user_prompt,
            },
        ],
        temperature: 0.0,
        response_format: ResponseFormat { kind: "json_object" },
    };

    let url = format!("{}/chat/completions", api_base.trim_end_matches('/'));
    let res = client
        .post(url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| AppError::CollaboratorFailure(format!("LLM request failed: {}", e)))?;

    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(AppError::CollaboratorFailure(format!(
            "LLM API returned {}: {}",
            status,
            error_detail(&text)
        )));
    }

    let json: serde_json::Value = res
        .json()
        .await
        .map_err(|e| AppError::CollaboratorFailure(format!("LLM response was not JSON: {}", e)))?;

    let reply = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| AppError::CollaboratorFailure("Invalid response format from LLM".to_string()))?
        .to_string();

    Ok(reply)
}

/// Pulls the provider's `error.message` out of a failure body, or falls back to a short excerpt.
fn error_detail(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = json["error"]["message"].as_str() {
            return message.to_string();
        }
    }

    let excerpt: String = body.trim().chars().take(200).collect();
    if excerpt.is_empty() {
        "no error detail".to_string()
    } else {
        excerpt
    }
}
