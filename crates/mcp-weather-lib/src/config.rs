//! Plain configuration structs shared by the server and client binaries.
//!
//! The binaries populate these from CLI flags / environment variables; tests
//! construct them directly (usually via `Default` plus a field override).

use std::time::Duration;

/// Public Open-Meteo endpoint used when no override is configured.
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com";

/// Settings for the outbound forecast request.
#[derive(Clone, Debug)]
pub struct ForecastSettings {
    /// Base URL of the forecast provider; `/v1/forecast` is appended.
    pub base_url: String,
    /// Per-request timeout. Expiry is treated like any other failure (absent reading).
    pub timeout: Duration,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FORECAST_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Application content for the sampling round-trip.
///
/// None of this is protocol-level; it only shapes the prompt sent to the peer.
#[derive(Clone, Debug)]
pub struct PoemSettings {
    pub system_prompt: String,
    /// Literary style requested in the user prompt ("Shakespearean" by default).
    pub style: String,
    /// Ordered model preference hints forwarded to the peer.
    pub model_hints: Vec<String>,
    pub max_tokens: u32,
}

impl Default for PoemSettings {
    fn default() -> Self {
        Self {
            system_prompt: "You are a poet!".to_string(),
            style: "Shakespearean".to_string(),
            model_hints: vec!["zhipuai".to_string()],
            max_tokens: 500,
        }
    }
}

/// Which chat completion API the client-side sampling handler talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatProvider {
    OpenAi,
    Ollama,
}

/// Settings for the client-side text-generation backend.
#[derive(Clone, Debug)]
pub struct ChatSettings {
    pub provider: ChatProvider,
    pub base_url: String,
    /// Only used by OpenAI-compatible providers.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            provider: ChatProvider::OpenAi,
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout: Duration::from_secs(120),
        }
    }
}
