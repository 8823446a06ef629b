// Rust guideline compliant 2026-10-19

use async_trait::async_trait;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars,
    service::{Peer, RequestContext, RoleServer},
    tool_handler, ServerHandler,
};
use serde::Deserialize;
use tracing::debug;

use super::wire;
use crate::notify::{LogEvent, Notifier, NotifyError, ProgressEvent};
use crate::sampling::{SampledContent, SamplingError, SamplingPeer, SamplingRequest};
use crate::tool::{TemperatureTool, ToolInvocation};

/// Logger name attached to `notifications/message` sent by this server.
pub const LOGGER_NAME: &str = "weather-service";

/// Name the server reports in its `initialize` response.
pub const SERVER_NAME: &str = "mcp-weather-server";

/// Input for the temperature tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetTemperatureInput {
    #[schemars(description = "The location latitude")]
    pub latitude: f64,
    #[schemars(description = "The location longitude")]
    pub longitude: f64,
}

/// MCP server exposing the `getTemperature` tool.
#[derive(Clone)]
pub struct WeatherMcpServer {
    tool: TemperatureTool,
    pub tool_router: ToolRouter<Self>,
}

#[rmcp::tool_router]
impl WeatherMcpServer {
    /// Construct a new server instance around a configured tool.
    pub fn new(tool: TemperatureTool) -> Self {
        Self {
            tool,
            tool_router: Self::tool_router(),
        }
    }

    /// Look up the current temperature and, if the client can sample, a poem about it.
    #[rmcp::tool(
        name = "getTemperature",
        description = "Get the temperature (in celsius) for a specific location"
    )]
    async fn get_temperature(
        &self,
        Parameters(input): Parameters<GetTemperatureInput>,
        context: RequestContext<RoleServer>,
    ) -> String {
        let invocation = ToolInvocation {
            latitude: input.latitude,
            longitude: input.longitude,
            progress_token: wire::progress_token(&context.meta),
        };
        let exchange = RmcpExchange::new(context.peer.clone());
        self.tool.invoke(&invocation, &exchange).await.text
    }
}

#[tool_handler]
impl ServerHandler for WeatherMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo {
            instructions: Some(
                "Weather MCP Server: getTemperature returns the current temperature for a latitude/longitude, with a poem when the client supports sampling.".into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_logging()
                .build(),
            ..Default::default()
        };
        info.server_info.name = SERVER_NAME.into();
        info.server_info.version = env!("CARGO_PKG_VERSION").into();
        info
    }
}

/// Per-call notification and sampling channel back to the connected client.
pub struct RmcpExchange {
    peer: Peer<RoleServer>,
}

impl RmcpExchange {
    pub fn new(peer: Peer<RoleServer>) -> Self {
        Self { peer }
    }
}

#[async_trait]
impl Notifier for RmcpExchange {
    async fn progress(&self, event: ProgressEvent) -> Result<(), NotifyError> {
        let Some(param) = wire::progress_param(&event)? else {
            debug!(
                completed = event.completed,
                label = %event.label,
                "no progress token; progress kept local"
            );
            return Ok(());
        };
        self.peer
            .notify_progress(param)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }

    async fn log(&self, event: LogEvent) -> Result<(), NotifyError> {
        self.peer
            .notify_logging_message(wire::logging_param(&event, LOGGER_NAME))
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

#[async_trait]
impl SamplingPeer for RmcpExchange {
    fn supports_sampling(&self) -> bool {
        self.peer
            .peer_info()
            .map(|info| info.capabilities.sampling.is_some())
            .unwrap_or(false)
    }

    async fn create_message(
        &self,
        request: SamplingRequest,
    ) -> Result<SampledContent, SamplingError> {
        let result = self
            .peer
            .create_message(wire::create_message_param(&request))
            .await
            .map_err(|e| SamplingError::Peer(e.to_string()))?;
        wire::sampled_content(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoemSettings;
    use crate::forecast::{ForecastProvider, ForecastReading};
    use crate::tool::{TOOL_DESCRIPTION, TOOL_NAME};
    use std::sync::Arc;

    struct NoForecast;

    #[async_trait]
    impl ForecastProvider for NoForecast {
        async fn fetch(&self, _latitude: f64, _longitude: f64) -> ForecastReading {
            ForecastReading::absent()
        }
    }

    fn server() -> WeatherMcpServer {
        WeatherMcpServer::new(TemperatureTool::new(
            Arc::new(NoForecast),
            PoemSettings::default(),
        ))
    }

    #[test]
    fn test_lists_get_temperature_tool() {
        let tools = server().tool_router.list_all();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, TOOL_NAME);
        assert_eq!(tools[0].description.as_deref(), Some(TOOL_DESCRIPTION));

        let properties = tools[0]
            .input_schema
            .get("properties")
            .and_then(|p| p.as_object())
            .expect("schema has properties");
        assert!(properties.contains_key("latitude"));
        assert!(properties.contains_key("longitude"));
    }

    #[test]
    fn test_server_info_advertises_tools_and_logging() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.logging.is_some());
        assert_eq!(info.server_info.name, SERVER_NAME);
    }
}
