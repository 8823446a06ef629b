// Rust guideline compliant 2026-10-19

use std::sync::Arc;

use anyhow::{anyhow, Result};
use rmcp::{
    model::{
        CallToolRequestParams, ClientCapabilities, ClientInfo, ClientRequest,
        CreateMessageRequestParams, CreateMessageResult, GetMeta, LoggingMessageNotificationParam,
        ProgressNotificationParam, Request, ServerResult,
    },
    service::{NotificationContext, Peer, RequestContext, RoleClient},
    ClientHandler, ErrorData,
};
use tracing::{debug, warn};

use super::wire;
use crate::callbacks::CallbackRegistry;
use crate::notify::ProgressToken;
use crate::tool::TOOL_NAME;

/// Name the client reports in its `initialize` request.
pub const CLIENT_NAME: &str = "mcp-weather-client";

/// rmcp client service routing server callbacks to the handlers registered
/// for one named upstream peer.
#[derive(Clone)]
pub struct WeatherClientService {
    peer_name: String,
    registry: Arc<CallbackRegistry>,
    sampling: bool,
    model_label: String,
}

impl WeatherClientService {
    /// `sampling` controls whether the sampling capability is advertised to the server.
    pub fn new(peer_name: impl Into<String>, registry: CallbackRegistry, sampling: bool) -> Self {
        Self {
            peer_name: peer_name.into(),
            registry: Arc::new(registry),
            sampling,
            model_label: CLIENT_NAME.to_string(),
        }
    }

    /// Model name reported back in sampling results.
    pub fn with_model_label(mut self, model: impl Into<String>) -> Self {
        self.model_label = model.into();
        self
    }

    pub fn peer_name(&self) -> &str {
        &self.peer_name
    }
}

impl ClientHandler for WeatherClientService {
    async fn create_message(
        &self,
        params: CreateMessageRequestParams,
        _context: RequestContext<RoleClient>,
    ) -> Result<CreateMessageResult, ErrorData> {
        let request = wire::incoming_sampling_request(&params);
        // Handler errors are not recovered here; the server sees them as a failed request.
        let response = self
            .registry
            .dispatch_sampling(&self.peer_name, request)
            .await
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        Ok(wire::create_message_result(&response, &self.model_label))
    }

    async fn on_progress(
        &self,
        params: ProgressNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) {
        let event = wire::progress_event(&params);
        if !self.registry.dispatch_progress(&self.peer_name, &event) {
            debug!(peer = %self.peer_name, ?event, "no progress handler registered");
        }
    }

    async fn on_logging_message(
        &self,
        params: LoggingMessageNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) {
        let event = wire::log_event(&params);
        if !self.registry.dispatch_logging(&self.peer_name, &event) {
            debug!(peer = %self.peer_name, ?event, "no logging handler registered");
        }
    }

    fn get_info(&self) -> ClientInfo {
        let mut info = ClientInfo::default();
        info.capabilities = if self.sampling {
            ClientCapabilities::builder().enable_sampling().build()
        } else {
            ClientCapabilities::default()
        };
        info.client_info.name = CLIENT_NAME.into();
        info.client_info.version = env!("CARGO_PKG_VERSION").into();
        info
    }
}

/// Call `getTemperature` on the connected server and return its text output.
///
/// When `progress_token` is given it is attached to the request so the server
/// can correlate progress notifications.
///
/// # Errors
///
/// Fails if the request cannot be sent, the server answers with something
/// other than a tool result, or the result carries no text.
pub async fn call_get_temperature(
    peer: &Peer<RoleClient>,
    latitude: f64,
    longitude: f64,
    progress_token: Option<ProgressToken>,
) -> Result<String> {
    let params = CallToolRequestParams {
        meta: None,
        name: TOOL_NAME.into(),
        arguments: Some(rmcp::object!({ "latitude": latitude, "longitude": longitude })),
        task: None,
    };
    let mut request = ClientRequest::CallToolRequest(Request::new(params));
    if let Some(token) = progress_token {
        request
            .get_meta_mut()
            .set_progress_token(wire::rmcp_progress_token(&token)?);
    }

    match peer.send_request(request).await? {
        ServerResult::CallToolResult(result) => {
            if result.is_error == Some(true) {
                warn!("server flagged the tool result as an error");
            }
            wire::tool_result_text(&result).ok_or_else(|| anyhow!("tool result has no text"))
        }
        other => Err(anyhow!("unexpected response to tools/call: {other:?}")),
    }
}
