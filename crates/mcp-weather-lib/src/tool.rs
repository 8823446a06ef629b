//! The `getTemperature` tool: forecast lookup, optional sampled poem, progress
//! and log notifications, all folded into a single text result.
//!
//! One invocation walks these stages in order and never revisits one:
//!
//! 1. start: DEBUG log and 0% progress
//! 2. fetch: forecast lookup, INFO log when no temperature came back
//! 3. sample (only if the peer advertises sampling): 50% progress and a poem request
//! 4. done: 100% progress and the formatted result
//!
//! No stage can fail the invocation. Missing data shows up as `"unknown"` and
//! a failed or skipped sample as [`SAMPLING_FALLBACK`].

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::PoemSettings;
use crate::forecast::{decimal_text, ForecastProvider};
use crate::notify::{emit_log, emit_progress, LogSeverity, Notifier, ProgressToken};
use crate::sampling::{request_sample, SamplingPeer, SamplingRequest, SAMPLING_FALLBACK};

/// Tool name as registered with the MCP router.
pub const TOOL_NAME: &str = "getTemperature";

/// Tool description shown to MCP clients.
pub const TOOL_DESCRIPTION: &str = "Get the temperature (in celsius) for a specific location";

/// Inbound call, as handed over by the dispatch layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolInvocation {
    pub latitude: f64,
    pub longitude: f64,
    pub progress_token: Option<ProgressToken>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolResult {
    pub text: String,
}

/// Orchestrates one `getTemperature` invocation against a per-call exchange.
///
/// Holds no per-invocation state, so a single instance serves concurrent calls.
#[derive(Clone)]
pub struct TemperatureTool {
    forecast: Arc<dyn ForecastProvider>,
    poem: PoemSettings,
}

impl TemperatureTool {
    pub fn new(forecast: Arc<dyn ForecastProvider>, poem: PoemSettings) -> Self {
        Self { forecast, poem }
    }

    /// Run the tool. `exchange` is the notification and sampling channel back
    /// to whoever made this call.
    #[instrument(skip_all, fields(lat = invocation.latitude, lon = invocation.longitude))]
    pub async fn invoke<E>(&self, invocation: &ToolInvocation, exchange: &E) -> ToolResult
    where
        E: Notifier + SamplingPeer + ?Sized,
    {
        let ToolInvocation {
            latitude,
            longitude,
            ref progress_token,
        } = *invocation;
        let token = progress_token.as_ref();
        let (lat, lon) = (decimal_text(latitude), decimal_text(longitude));

        info!("getTemperature called");

        emit_log(
            exchange,
            LogSeverity::Debug,
            format!("Call getTemperature Tool with latitude: {lat} and longitude: {lon}"),
        )
        .await;
        emit_progress(exchange, token, 0.0, "Retrieving weather forecast").await;

        let reading = self.forecast.fetch(latitude, longitude).await;
        if reading.temperature_celsius.is_none() {
            emit_log(
                exchange,
                LogSeverity::Info,
                format!(
                    "No temperature data returned from weather API for latitude: {lat}, longitude: {lon}"
                ),
            )
            .await;
        }

        let temperature_text = reading.temperature_text();
        info!(temperature = %temperature_text, "derived temperature");

        // Capability is a per-connection fact; re-read it on every call.
        let supports_sampling = exchange.supports_sampling();
        if supports_sampling {
            info!("client supports sampling; starting sampling");
            emit_progress(exchange, token, 0.5, "Start sampling").await;
        }

        let request = SamplingRequest {
            system_prompt: self.poem.system_prompt.clone(),
            user_message: self.sampling_prompt(&temperature_text, latitude, longitude),
            model_hints: self.poem.model_hints.clone(),
            max_tokens: self.poem.max_tokens,
        };
        let poem = match request_sample(exchange, exchange, request, supports_sampling).await {
            Ok(response) => response.text,
            Err(_) => SAMPLING_FALLBACK.to_string(),
        };

        emit_progress(exchange, token, 1.0, "Task completed").await;
        info!("getTemperature completed");

        ToolResult {
            text: format_result(&poem, &temperature_text, latitude, longitude),
        }
    }

    /// User message sent to the peer when sampling.
    pub fn sampling_prompt(&self, temperature_text: &str, latitude: f64, longitude: f64) -> String {
        format!(
            "For a weather forecast (temperature is in Celsius): {temperature_text}.\n\
             At location with latitude: {} and longitude: {}.\n\
             Please write an epic poem about this forecast using a {} style.\n",
            decimal_text(latitude),
            decimal_text(longitude),
            self.poem.style
        )
    }
}

/// Final text returned to the invoker.
pub fn format_result(poem: &str, temperature_text: &str, latitude: f64, longitude: f64) -> String {
    format!(
        "Weather Poem: {poem}\n\
         about the weather: {temperature_text}°C at location with latitude: {} and longitude: {}\n",
        decimal_text(latitude),
        decimal_text(longitude)
    )
}
