use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{ChatBackend, ChatError};
use crate::config::ChatSettings;

/// Local Ollama `/api/chat` backend (non-streaming).
pub struct OllamaBackend {
    client: reqwest::Client,
    url: String,
    model: String,
    temperature: f32,
}

impl OllamaBackend {
    pub fn new(client: reqwest::Client, settings: &ChatSettings) -> Self {
        Self {
            client,
            url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<Option<String>, ChatError> {
        let url = format!("{}/api/chat", self.url);

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_text },
            ],
            "stream": false,
            "options": {
                "temperature": self.temperature,
            },
        });

        debug!("Ollama request to {}", url);

        let response = self
            .client
            .post(&url)
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
        let message = resp
            .get("message")
            .ok_or_else(|| ChatError::Parse("missing message".into()))?;

        Ok(message
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}
