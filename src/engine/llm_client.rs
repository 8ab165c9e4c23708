use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::settings::ProviderSettings;
use crate::engine::prompt_builder::PromptBuilder;
use crate::engine::provider::{DecisionProvider, DecisionRequest};
use crate::model::llm_decode::decode_proposal;
use crate::model::proposal::Proposal;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("provider response had no text content")]
    MissingText,

    #[error("API key variable {0} is not set")]
    MissingApiKey(String),
}

#[derive(Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessagesResponse {
    /// First text block, if any.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .filter(|b| b.kind == "text")
            .find_map(|b| b.text.as_deref())
    }
}

/// Decision provider backed by the Anthropic messages API.
pub struct AnthropicProvider {
    client: Client,
    settings: ProviderSettings,
    api_key: String,
    system: String,
}

impl AnthropicProvider {
    pub fn new(settings: ProviderSettings, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            settings,
            api_key: api_key.into(),
            system: PromptBuilder::system_directive(),
        })
    }

    /// Reads the key from the environment variable named in `settings`.
    pub fn from_env(settings: ProviderSettings) -> Result<Self> {
        let key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey(settings.api_key_env.clone()))?;
        Self::new(settings, key)
    }

    pub fn masked_key(&self) -> String {
        masked_key(&self.api_key)
    }

    fn send(&self, system: Option<&str>, user: &str, max_tokens: u32) -> Result<String> {
        let req = MessagesRequest {
            model: &self.settings.model,
            max_tokens,
            temperature: self.settings.temperature,
            system,
            messages: vec![ChatMessage {
                role: "user",
                content: user,
            }],
        };

        let resp = self
            .client
            .post(&self.settings.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.settings.api_version)
            .json(&req)
            .send()
            .context("sending provider request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: MessagesResponse = resp.json().context("reading provider response")?;
        parsed
            .text()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::MissingText.into())
    }

    pub fn test_connection(&self) -> Result<String> {
        let text = self.send(None, "Reply with only: CONNECTION_OK", 50)?;
        if text.contains("CONNECTION_OK") {
            Ok(format!("Connected to {} as {}", self.settings.model, self.masked_key()))
        } else {
            Ok("Connected but unexpected response".to_string())
        }
    }
}

impl DecisionProvider for AnthropicProvider {
    fn propose(&self, request: &DecisionRequest) -> Result<Proposal> {
        let user = PromptBuilder::user_message(request)?;

        tracing::info!(
            request_id = %request.request_id,
            model = %self.settings.model,
            key = %self.masked_key(),
            "calling decision provider"
        );

        let text = self.send(Some(&self.system), &user, self.settings.max_tokens)?;
        let proposal = decode_proposal(&text)
            .with_context(|| format!("decoding proposal for request {}", request.request_id))?;

        tracing::debug!(
            request_id = %request.request_id,
            starts_arc = proposal.starts_arc(),
            scattered = proposal.scattered_events.len(),
            "proposal decoded"
        );
        Ok(proposal)
    }
}

/// Keeps the first and last four characters.
pub fn masked_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_keys_are_fully_masked() {
        assert_eq!(masked_key("abc"), "****");
        assert_eq!(masked_key("sk-ant-0123456789"), "sk-a...6789");
    }

    #[test]
    fn response_text_skips_non_text_blocks() {
        let resp: MessagesResponse = serde_json::from_str(
            r#"{"content": [{"type": "thinking"}, {"type": "text", "text": "{\"reasoning\": \"ok\"}"}]}"#,
        )
        .unwrap();
        assert_eq!(resp.text(), Some("{\"reasoning\": \"ok\"}"));

        let empty: MessagesResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.text().is_none());
    }

    #[test]
    fn request_omits_absent_system_prompt() {
        let req = MessagesRequest {
            model: "m",
            max_tokens: 10,
            temperature: 1.0,
            system: None,
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn from_env_requires_the_key() {
        let settings = ProviderSettings {
            api_key_env: "STORYTELLER_ENGINE_TEST_UNSET_KEY".into(),
            ..ProviderSettings::default()
        };
        let err = AnthropicProvider::from_env(settings).err().unwrap();
        assert!(err.to_string().contains("STORYTELLER_ENGINE_TEST_UNSET_KEY"));
    }
}
