use std::env;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde_json::{json, Value};

use crate::web::models::Message;

/// Model and sampling parameters are fixed; the HTTP caller gets no knobs.
pub const MODEL: &str = "mistral-small-latest";
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1000;

const DEFAULT_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends the full message sequence upstream, in order, and returns the
    /// first completion's text.
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

// A wrapper for the Mistral chat-completions API
pub struct MistralClient {
    api_url: String,
    api_key: String,
    client: Client,
}

impl MistralClient {
    /// Reads the upstream credential and endpoint from the environment.
    /// The API key is required; it is never embedded in source.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("MISTRAL_API_KEY")
            .context("MISTRAL_API_KEY is not set; an upstream credential is required")?;

        let api_url =
            env::var("MISTRAL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        info!("Using Mistral API at: {}", api_url);

        Ok(Self {
            api_url,
            api_key,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl CompletionBackend for MistralClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let payload = json!({
            "model": MODEL,
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });
        debug!("Payload: {}", payload);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Upstream returned {}: {}", status, body);
            return Err(anyhow!("{}", upstream_error_message(&body)));
        }

        let body: Value = response.json().await?;
        debug!("Response JSON: {}", body);

        extract_completion(&body)
    }
}

/// Pulls `choices[0].message.content` out of a chat-completion body.
fn extract_completion(body: &Value) -> Result<String> {
    body.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(|content| content.to_string())
        .ok_or_else(|| anyhow!("Failed to extract content from response"))
}

/// Best-effort human-readable message from an upstream error body.
fn upstream_error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => "Upstream API request failed".to_string(),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod stub {
    use std::sync::Mutex;

    use super::*;

    /// Test double recording every message sequence it is asked to complete.
    pub struct StubBackend {
        reply: Result<String, String>,
        calls: Mutex<Vec<Vec<Message>>>,
    }

    impl StubBackend {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn recorded_calls(&self) -> Vec<Vec<Message>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionBackend for StubBackend {
        async fn complete(&self, messages: &[Message]) -> Result<String> {
            self.calls.lock().unwrap().push(messages.to_vec());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(message) => Err(anyhow!("{}", message)),
            }
        }
    }
}

#[cfg(test)]
pub use stub::StubBackend;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_completion_text() {
        let body = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "hi there" } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        });
        assert_eq!(extract_completion(&body).unwrap(), "hi there");
    }

    #[test]
    fn malformed_completion_body_is_an_error() {
        let body = json!({ "choices": [] });
        assert!(extract_completion(&body).is_err());

        let body = json!({ "choices": [{ "message": { "role": "assistant" } }] });
        assert!(extract_completion(&body).is_err());
    }

    #[test]
    fn error_message_prefers_the_upstream_message_field() {
        let body = r#"{"message": "Unauthorized", "type": "invalid_request"}"#;
        assert_eq!(upstream_error_message(body), "Unauthorized");
    }

    #[test]
    fn error_message_falls_back_to_the_raw_body() {
        assert_eq!(upstream_error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn error_message_never_comes_back_empty() {
        assert_eq!(upstream_error_message(""), "Upstream API request failed");
        assert_eq!(upstream_error_message("   "), "Upstream API request failed");
    }
}
