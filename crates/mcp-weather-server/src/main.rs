// Rust guideline compliant 2026-10-19

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mcp_weather::{
    config::DEFAULT_FORECAST_URL, mcp::WeatherMcpServer, ForecastSettings, OpenMeteoClient,
    PoemSettings, TemperatureTool,
};
use rmcp::{transport::stdio, ServiceExt};
use tracing::info;

/// MCP stdio server exposing the `getTemperature` tool.
#[derive(Parser, Debug)]
#[command(name = "mcp-weather-server", version)]
struct Args {
    /// Base URL of the Open-Meteo compatible forecast API.
    #[arg(long, env = "WEATHER_FORECAST_URL", default_value = DEFAULT_FORECAST_URL)]
    forecast_url: String,

    /// Timeout for the forecast request, in seconds.
    #[arg(long, env = "WEATHER_FORECAST_TIMEOUT_SECS", default_value_t = 10)]
    forecast_timeout_secs: u64,

    /// Literary style requested when asking the client for a poem.
    #[arg(long, env = "WEATHER_POEM_STYLE", default_value = "Shakespearean")]
    poem_style: String,

    /// System prompt sent with sampling requests.
    #[arg(long, env = "WEATHER_SYSTEM_PROMPT", default_value = "You are a poet!")]
    system_prompt: String,

    /// Model preference hint for sampling requests. Repeatable, most preferred first.
    #[arg(long = "model-hint", value_name = "NAME", default_values_t = vec!["zhipuai".to_string()])]
    model_hints: Vec<String>,

    /// Maximum tokens requested from the client when sampling.
    #[arg(long, default_value_t = 500)]
    max_tokens: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP transport, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let forecast = OpenMeteoClient::new(&ForecastSettings {
        base_url: args.forecast_url.clone(),
        timeout: Duration::from_secs(args.forecast_timeout_secs),
    })
    .context("building forecast HTTP client")?;

    let poem = PoemSettings {
        system_prompt: args.system_prompt,
        style: args.poem_style,
        model_hints: args.model_hints,
        max_tokens: args.max_tokens,
    };

    info!(forecast_url = %args.forecast_url, "starting weather MCP server on stdio");

    let service = WeatherMcpServer::new(TemperatureTool::new(Arc::new(forecast), poem))
        .serve(stdio())
        .await
        .context("initialising MCP session")?;
    let reason = service.waiting().await?;
    info!(?reason, "MCP session ended");
    Ok(())
}
