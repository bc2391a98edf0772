//! Client for the optional external chat-completion API
//!
//! The API is OpenAI-compatible: POST {api_url} with a messages array,
//! first choice's message content is the reply. Configuration is an
//! explicitly constructed object injected into the responder; absence of
//! a key degrades to templated replies and never fails startup.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Errors from the completion dependency
///
/// These never reach an HTTP client: the responder absorbs every variant
/// by falling back to the templated reply.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Completion request failed: {0}")]
    RequestFailed(String),

    #[error("Completion API error: status {status}")]
    ApiError { status: u16, message: String },

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
}

/// Configuration for the completion API, read from the environment
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl CompletionConfig {
    /// Build from environment variables; None when no key is configured
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("COMPLETION_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }

        let api_url = std::env::var("COMPLETION_API_URL")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1/chat/completions".to_string());
        let model = std::env::var("COMPLETION_MODEL")
            .unwrap_or_else(|_| "openai/gpt-3.5-turbo".to_string());

        Some(Self {
            api_key,
            api_url,
            model,
            timeout: Duration::from_secs(30),
        })
    }
}

/// One message in a completion conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

/// Completion API client
#[derive(Clone)]
pub struct CompletionClient {
    config: CompletionConfig,
    client: Client,
}

impl CompletionClient {
    /// Create a new client; the request timeout is baked into the
    /// underlying HTTP client so a slow upstream cannot hang a request
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::RequestFailed(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Ask the completion API for a reply
    ///
    /// The system prompt carries the database context; caller-supplied
    /// history is prepended before the current message.
    pub async fn chat(
        &self,
        system_prompt: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String, CompletionError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatTurn {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        });
        messages.extend(history.iter().cloned());
        messages.push(ChatTurn {
            role: "user".to_string(),
            content: message.to_string(),
        });

        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: 0.7,
            max_tokens: 1000,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let parsed: CompletionResponse = response
                    .json()
                    .await
                    .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

                parsed
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| choice.message.content)
                    .ok_or_else(|| {
                        CompletionError::MalformedResponse("empty choices array".to_string())
                    })
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(CompletionError::ApiError {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_response_parsing() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "We have two halls."}}
            ]
        }"#;

        let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "We have two halls.");
    }

    #[test]
    fn test_empty_choices_is_malformed() {
        let json = r#"{"choices": []}"#;
        let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn test_chat_turn_round_trip() {
        let turn = ChatTurn {
            role: "user".to_string(),
            content: "What venues do you have?".to_string(),
        };

        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("\"role\":\"user\""));

        let back: ChatTurn = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, turn.content);
    }
}
