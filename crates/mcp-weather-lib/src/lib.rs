//! Library entry point for the MCP weather demo.
//!
//! The server side answers `getTemperature` calls: it looks up the current
//! temperature, reports progress and log lines to the caller, and when the
//! caller supports sampling asks it for a poem about the forecast. The client
//! side receives those notifications and answers sampling requests with a
//! chat backend.
//!
//! Transport, framing and tool dispatch come from `rmcp`; the [`mcp`] module
//! holds the thin adapters between rmcp and the protocol-independent pieces
//! below.
//
// Public modules
pub mod callbacks;
pub mod chat;
pub mod config;
pub mod forecast;
pub mod mcp;
pub mod notify;
pub mod sampling;
pub mod tool;

// Re-export primary types for ergonomic use.
pub use callbacks::{CallbackKind, CallbackRegistry, ClientCallbacks, DEFAULT_PEER_NAME};
pub use chat::{backend_from_settings, ChatBackend, ChatError};
pub use config::{ChatProvider, ChatSettings, ForecastSettings, PoemSettings};
pub use forecast::{ForecastProvider, ForecastReading, OpenMeteoClient};
pub use notify::{LogEvent, LogSeverity, Notifier, ProgressEvent, ProgressToken};
pub use sampling::{SamplingPeer, SamplingRequest, SamplingResponse, SAMPLING_FALLBACK};
pub use tool::{TemperatureTool, ToolInvocation, ToolResult, TOOL_NAME};
