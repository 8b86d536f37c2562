use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use counsel_core::backend::ChatBackend;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Calls an OpenAI-compatible chat-completions endpoint.
///
/// Both upstream providers speak the same wire shape; the endpoint is
/// selected purely by base URL + model name, so one client type covers the
/// search-oriented model and the general-purpose model.
pub struct OpenAiBackend {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl OpenAiBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: 120,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let mut messages = Vec::new();
        if !system.is_empty() {
            messages.push(ChatMessage {
                role: "system".into(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".into(),
            content: user.to_string(),
        });

        let request_body = ChatRequest {
            model: self.model.clone(),
            messages,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        info!(
            model = %self.model,
            base_url = %self.base_url,
            prompt_len = user.len(),
            "calling chat completions API"
        );

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()?;

        let response = client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .with_context(|| format!("chat request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(model = %self.model, status = %status, "chat API returned non-2xx: {}", body);
            bail!("chat API error {status}: {body}");
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("failed to parse chat completions response")?;

        let content = match parsed.choices.into_iter().next() {
            Some(choice) if !choice.message.content.is_empty() => choice.message.content,
            _ => bail!("chat API reply contained no choices"),
        };

        info!(model = %self.model, reply_len = content.len(), "chat response received");

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_content_is_read_from_first_choice() {
        let body = r#"{
            "id": "gen-123",
            "model": "sonar",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Here are the lawyers."},
                 "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).expect("should parse");
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        assert_eq!(content, "Here are the lawyers.");
    }

    #[test]
    fn empty_choices_parse_but_yield_nothing() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices": []}"#).expect("should parse");
        assert!(parsed.choices.is_empty());
    }
}
