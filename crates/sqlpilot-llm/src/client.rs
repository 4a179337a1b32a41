//! Chat model abstraction and the Groq chat-completions client.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlpilot_core::config::LlmConfig;
use std::env;

/// A chat model that completes a single prompt into text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
    fn name(&self) -> &str;
}

/// Client for the Groq API (OpenAI-compatible chat completions).
#[derive(Debug)]
pub struct GroqClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GroqClient {
    /// Reads the API key from the environment variable named in the config.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self, LlmError> {
        let api_key =
            env::var(&cfg.api_key_env).map_err(|_| LlmError::MissingApiKey(cfg.api_key_env.clone()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

#[async_trait]
impl ChatModel for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_chat_completions_wire_shape() {
        let body = ChatRequest {
            model: "llama-3.3-70b-versatile",
            temperature: 0.0,
            messages: vec![ChatMessage {
                role: "user",
                content: "prompt text",
            }],
        };
        let encoded = serde_json::to_value(&body).unwrap();
        assert_eq!(
            encoded,
            serde_json::json!({
                "model": "llama-3.3-70b-versatile",
                "temperature": 0.0,
                "messages": [{"role": "user", "content": "prompt text"}]
            })
        );
    }

    #[test]
    fn response_body_decodes_first_choice() {
        let reply: ChatResponse = serde_json::from_value(serde_json::json!({
            "id": "cmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "SELECT 1;"}}
            ]
        }))
        .unwrap();
        assert_eq!(reply.choices[0].message.content, "SELECT 1;");
    }

    #[test]
    fn from_config_requires_api_key_env() {
        let cfg = LlmConfig {
            api_key_env: "SQLPILOT_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        let err = GroqClient::from_config(&cfg).unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey(var) if var == "SQLPILOT_TEST_UNSET_KEY"));
    }
}
