use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use mcp_weather::chat::{ChatBackend, ChatError};
use mcp_weather::mcp::{call_get_temperature, WeatherClientService, WeatherMcpServer};
use mcp_weather::{
    CallbackRegistry, ClientCallbacks, ForecastSettings, LogEvent, LogSeverity, OpenMeteoClient,
    PoemSettings, ProgressToken, TemperatureTool, DEFAULT_PEER_NAME, SAMPLING_FALLBACK,
};
use rmcp::ServiceExt;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Chat backend that always answers with the same text and records what it was asked.
struct CannedPoet {
    answer: String,
    prompts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ChatBackend for CannedPoet {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<Option<String>, ChatError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_text.to_string()));
        Ok(Some(self.answer.clone()))
    }
}

/// Chat backend whose upstream always answers with a server error.
struct FailingPoet;

#[async_trait]
impl ChatBackend for FailingPoet {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_text: &str,
    ) -> Result<Option<String>, ChatError> {
        Err(ChatError::Api {
            status: 500,
            body: "boom".to_string(),
        })
    }
}

/// Notifications observed by the client for one peer.
#[derive(Default)]
struct Observed {
    progress: Mutex<Vec<f64>>,
    logs: Mutex<Vec<LogEvent>>,
}

async fn forecast_mock(body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn weather_server(forecast: &MockServer) -> Result<WeatherMcpServer> {
    let settings = ForecastSettings {
        base_url: forecast.uri(),
        ..ForecastSettings::default()
    };
    let client = OpenMeteoClient::new(&settings)?;
    Ok(WeatherMcpServer::new(TemperatureTool::new(
        Arc::new(client),
        PoemSettings::default(),
    )))
}

/// Registry with the stock sampling handler plus recording progress/log handlers.
fn recording_registry(callbacks: &Arc<ClientCallbacks>, observed: &Arc<Observed>) -> CallbackRegistry {
    let mut registry = CallbackRegistry::new();
    callbacks.register(&mut registry, DEFAULT_PEER_NAME);

    let progress = Arc::clone(observed);
    let logs = Arc::clone(observed);
    registry
        .on_progress(DEFAULT_PEER_NAME, move |event| {
            ClientCallbacks::handle_progress(event);
            progress.progress.lock().unwrap().push(event.completed);
        })
        .on_logging(DEFAULT_PEER_NAME, move |event| {
            ClientCallbacks::handle_logging(event);
            logs.logs.lock().unwrap().push(event.clone());
        });
    registry
}

/// Notifications may still be in flight when the tool result arrives; poll briefly.
async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn received_progress(observed: &Observed) -> Vec<f64> {
    observed.progress.lock().unwrap().clone()
}

/// End-to-end: rmcp client with sampling calls the rmcp server over an in-memory pipe.
///
/// The test:
/// 1. Mocks the forecast API with a 21.3 °C reading.
/// 2. Serves `WeatherMcpServer` on one end of a duplex stream.
/// 3. Connects a sampling-capable `WeatherClientService` on the other end.
/// 4. Calls `getTemperature` with a progress token.
/// 5. Checks the sampled poem, the temperature, the progress sequence and the logs.
#[tokio::test]
async fn tool_call_with_sampling_roundtrip() -> Result<()> {
    let forecast = forecast_mock(json!({ "current": { "temperature_2m": 21.3 } })).await;
    let server = weather_server(&forecast)?;

    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    let server_task = tokio::spawn(async move {
        let running = server.serve(server_io).await?;
        running.waiting().await?;
        anyhow::Ok(())
    });

    let poet = Arc::new(CannedPoet {
        answer: "A sonnet...".to_string(),
        prompts: Mutex::new(Vec::new()),
    });
    let callbacks = ClientCallbacks::new();
    let observed = Arc::new(Observed::default());
    let registry = recording_registry(&callbacks, &observed);
    callbacks.bind_backend(poet.clone())?;

    let client = WeatherClientService::new(DEFAULT_PEER_NAME, registry, true)
        .serve(client_io)
        .await?;

    let text = call_get_temperature(
        client.peer(),
        52.52,
        13.41,
        Some(ProgressToken(json!("roundtrip-1"))),
    )
    .await?;

    assert!(text.contains("A sonnet..."), "unexpected result: {text}");
    assert!(text.contains("21.3"));

    let prompts = poet.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].0, "You are a poet!");
    assert!(prompts[0].1.contains("21.3"));

    let has_call_trace = || {
        observed
            .logs
            .lock()
            .unwrap()
            .iter()
            .any(|l| l.severity == LogSeverity::Debug && l.message.contains("52.52"))
    };
    eventually(|| observed.progress.lock().unwrap().len() >= 3 && has_call_trace()).await;
    assert_eq!(received_progress(&observed), vec![0.0, 0.5, 1.0]);
    assert!(has_call_trace());

    client.cancel().await?;
    server_task.abort();
    Ok(())
}

/// Without the sampling capability the server never asks for a poem.
#[tokio::test]
async fn tool_call_without_sampling_uses_fallback() -> Result<()> {
    let forecast = forecast_mock(json!({ "unexpected": true })).await;
    let server = weather_server(&forecast)?;

    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    let server_task = tokio::spawn(async move {
        let running = server.serve(server_io).await?;
        running.waiting().await?;
        anyhow::Ok(())
    });

    let poet = Arc::new(CannedPoet {
        answer: "never used".to_string(),
        prompts: Mutex::new(Vec::new()),
    });
    let callbacks = ClientCallbacks::new();
    let observed = Arc::new(Observed::default());
    let registry = recording_registry(&callbacks, &observed);
    callbacks.bind_backend(poet.clone())?;

    let client = WeatherClientService::new(DEFAULT_PEER_NAME, registry, false)
        .serve(client_io)
        .await?;

    let text = call_get_temperature(
        client.peer(),
        52.52,
        13.41,
        Some(ProgressToken(json!(99))),
    )
    .await?;

    assert!(text.contains(SAMPLING_FALLBACK));
    assert!(text.contains("unknown"));
    assert!(poet.prompts.lock().unwrap().is_empty());

    let has_missing_data_log = || {
        observed
            .logs
            .lock()
            .unwrap()
            .iter()
            .any(|l| l.severity == LogSeverity::Info)
    };
    eventually(|| observed.progress.lock().unwrap().len() >= 2 && has_missing_data_log()).await;
    assert_eq!(received_progress(&observed), vec![0.0, 1.0]);
    assert!(has_missing_data_log());

    client.cancel().await?;
    server_task.abort();
    Ok(())
}

/// A chat backend failure on the client reaches the server as a failed
/// sampling request; the tool still answers, with the fallback text.
#[tokio::test]
async fn client_backend_failure_falls_back_on_server() -> Result<()> {
    let forecast = forecast_mock(json!({ "current": { "temperature_2m": 21.3 } })).await;
    let server = weather_server(&forecast)?;

    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    let server_task = tokio::spawn(async move {
        let running = server.serve(server_io).await?;
        running.waiting().await?;
        anyhow::Ok(())
    });

    let callbacks = ClientCallbacks::new();
    let observed = Arc::new(Observed::default());
    let registry = recording_registry(&callbacks, &observed);
    callbacks.bind_backend(Arc::new(FailingPoet))?;

    let client = WeatherClientService::new(DEFAULT_PEER_NAME, registry, true)
        .serve(client_io)
        .await?;

    let text = call_get_temperature(
        client.peer(),
        52.52,
        13.41,
        Some(ProgressToken(json!("failing-backend"))),
    )
    .await?;

    assert!(text.contains(SAMPLING_FALLBACK), "unexpected result: {text}");
    assert!(text.contains("21.3"));

    let has_fallback_warning = || {
        observed.logs.lock().unwrap().iter().any(|l| {
            l.severity == LogSeverity::Warning
                && l.message
                    .starts_with("Sampling failed, falling back to default text:")
                && l.message.contains("boom")
        })
    };
    eventually(|| observed.progress.lock().unwrap().len() >= 3 && has_fallback_warning()).await;
    assert_eq!(received_progress(&observed), vec![0.0, 0.5, 1.0]);
    assert!(has_fallback_warning());

    client.cancel().await?;
    server_task.abort();
    Ok(())
}
