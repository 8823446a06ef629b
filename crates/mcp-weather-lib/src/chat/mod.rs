//! Text-generation backends used by the client-side sampling handler.
//!
//! Each backend implements [`ChatBackend`]: one system prompt plus one user
//! message in, the assistant's text out. A backend may legitimately return no
//! text (`Ok(None)`); the caller decides how to coerce that.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ChatProvider, ChatSettings};

pub mod ollama;
pub mod openai;

pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("chat backend not configured: {0}")]
    NotConfigured(String),
}

/// Trait for chat completion providers.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_text: &str)
        -> Result<Option<String>, ChatError>;
}

/// Build the backend selected by `settings`.
///
/// # Errors
///
/// Returns [`ChatError::NotConfigured`] when an OpenAI backend has no API key,
/// or [`ChatError::Http`] if the HTTP client cannot be built.
pub fn backend_from_settings(settings: &ChatSettings) -> Result<Arc<dyn ChatBackend>, ChatError> {
    let client = reqwest::Client::builder().timeout(settings.timeout).build()?;
    let backend: Arc<dyn ChatBackend> = match settings.provider {
        ChatProvider::OpenAi => {
            let api_key = settings
                .api_key
                .clone()
                .ok_or_else(|| ChatError::NotConfigured("missing OpenAI API key".into()))?;
            Arc::new(OpenAiBackend::new(client, api_key, settings))
        }
        ChatProvider::Ollama => Arc::new(OllamaBackend::new(client, settings)),
    };
    Ok(backend)
}
