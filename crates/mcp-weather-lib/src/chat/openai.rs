use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{ChatBackend, ChatError};
use crate::config::ChatSettings;

/// OpenAI-compatible `/v1/chat/completions` backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiBackend {
    pub fn new(client: reqwest::Client, api_key: String, settings: &ChatSettings) -> Self {
        Self {
            client,
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<Option<String>, ChatError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_text },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        debug!("OpenAI request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Api { status, body });
        }

        let resp: Value = response.json().await?;
        let message = resp["choices"][0]
            .get("message")
            .ok_or_else(|| ChatError::Parse("missing choices[0].message".into()))?;

        // `content` is null when the model answered with tool calls or a refusal.
        Ok(message
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}
