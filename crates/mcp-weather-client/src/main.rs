//! Command-line MCP client for the weather server.
//!
//! Spawns the server as a child process over stdio, registers progress,
//! logging and sampling handlers for it, calls `getTemperature` once and
//! prints the tool's text output.
//!
//! Usage examples:
//!  mcp-weather-client --latitude 52.52 --longitude 13.41
//!  mcp-weather-client --backend ollama --llm-base-url http://localhost:11434 --llm-model llama3
//!  mcp-weather-client --no-sampling

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mcp_weather::{
    backend_from_settings, mcp::call_get_temperature, mcp::WeatherClientService, CallbackRegistry,
    ChatProvider, ChatSettings, ClientCallbacks, ProgressToken, DEFAULT_PEER_NAME,
};
use rmcp::{
    transport::{ConfigureCommandExt, TokioChildProcess},
    ServiceExt,
};
use serde_json::json;
use tokio::process::Command;
use tracing::info;

/// Chat completion API used to answer sampling requests.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    Openai,
    Ollama,
}

impl From<Backend> for ChatProvider {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Openai => ChatProvider::OpenAi,
            Backend::Ollama => ChatProvider::Ollama,
        }
    }
}

/// CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "mcp-weather-client",
    about = "Ask the MCP weather server for the temperature (and a poem)",
    version
)]
struct Cli {
    /// Server executable to spawn.
    #[arg(long, env = "WEATHER_SERVER_COMMAND", default_value = "mcp-weather-server")]
    server_command: String,

    /// Extra argument passed to the server executable. Repeatable.
    #[arg(long = "server-arg", value_name = "ARG", allow_hyphen_values = true)]
    server_args: Vec<String>,

    /// Name the callbacks are registered under.
    #[arg(long, default_value = DEFAULT_PEER_NAME)]
    peer_name: String,

    #[arg(long, default_value_t = 52.52, allow_hyphen_values = true)]
    latitude: f64,

    #[arg(long, default_value_t = 13.41, allow_hyphen_values = true)]
    longitude: f64,

    /// Chat backend for sampling requests.
    #[arg(long, value_enum, default_value_t = Backend::Openai)]
    backend: Backend,

    /// Base URL of the chat backend. Defaults per backend when omitted.
    #[arg(long, env = "LLM_BASE_URL")]
    llm_base_url: Option<String>,

    /// API key for OpenAI-compatible backends.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    llm_api_key: Option<String>,

    /// Model name sent to the chat backend.
    #[arg(long, env = "LLM_MODEL")]
    llm_model: Option<String>,

    /// Timeout for one chat completion, in seconds.
    #[arg(long, default_value_t = 120)]
    llm_timeout_secs: u64,

    /// Do not advertise the sampling capability to the server.
    #[arg(long)]
    no_sampling: bool,
}

impl Cli {
    fn chat_settings(&self) -> ChatSettings {
        let defaults = ChatSettings::default();
        let provider = ChatProvider::from(self.backend);
        let (default_url, default_model) = match provider {
            ChatProvider::OpenAi => (defaults.base_url.clone(), defaults.model.clone()),
            ChatProvider::Ollama => ("http://localhost:11434".to_string(), "llama3".to_string()),
        };
        ChatSettings {
            provider,
            base_url: self.llm_base_url.clone().unwrap_or(default_url),
            api_key: self.llm_api_key.clone(),
            model: self.llm_model.clone().unwrap_or(default_model),
            timeout: Duration::from_secs(self.llm_timeout_secs),
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = cli.chat_settings();

    // Handlers are registered first; the backend they call is bound once it exists.
    let callbacks = ClientCallbacks::new();
    let mut registry = CallbackRegistry::new();
    callbacks.register(&mut registry, &cli.peer_name);
    if !cli.no_sampling {
        let backend = backend_from_settings(&settings).context("configuring chat backend")?;
        callbacks.bind_backend(backend)?;
    }

    let transport = TokioChildProcess::new(Command::new(&cli.server_command).configure(|cmd| {
        cmd.args(&cli.server_args);
    }))
    .with_context(|| format!("spawning {}", cli.server_command))?;

    let client = WeatherClientService::new(cli.peer_name.clone(), registry, !cli.no_sampling)
        .with_model_label(settings.model.clone())
        .serve(transport)
        .await
        .context("initialising MCP session")?;
    info!(peer = %cli.peer_name, server = ?client.peer_info(), "connected");

    let token = ProgressToken(json!(format!("{}-{}", cli.peer_name, std::process::id())));
    let text = call_get_temperature(client.peer(), cli.latitude, cli.longitude, Some(token)).await?;
    println!("{text}");

    client.cancel().await?;
    Ok(())
}
