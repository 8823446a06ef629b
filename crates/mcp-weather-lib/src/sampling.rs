//! Optional text-generation round-trip to the connected peer.
//!
//! Sampling is best effort. Every failure mode ends up as a [`SamplingError`]
//! which the tool handler maps to [`SAMPLING_FALLBACK`]; nothing here can fail
//! a tool invocation.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::notify::{emit_log, LogSeverity, Notifier};

/// Text used in place of a sampled answer when none is available.
pub const SAMPLING_FALLBACK: &str = "MCP client doesn't provide sampling capability.";

#[derive(Clone, Debug, PartialEq)]
pub struct SamplingRequest {
    pub system_prompt: String,
    pub user_message: String,
    /// Model preference hints, most preferred first.
    pub model_hints: Vec<String>,
    pub max_tokens: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SamplingResponse {
    pub text: String,
}

/// Content block returned by the peer, before we decide whether it is usable.
#[derive(Clone, Debug, PartialEq)]
pub enum SampledContent {
    Text(String),
    /// Any non-text content; carries the content type for diagnostics.
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SamplingError {
    #[error("peer does not support sampling")]
    Unsupported,
    #[error("sampling request failed: {0}")]
    Peer(String),
    #[error("sampling response is malformed: {0}")]
    Malformed(String),
    #[error("sampling response has no text content (got `{0}`)")]
    NoText(String),
}

/// The connected peer, as far as sampling is concerned.
#[async_trait]
pub trait SamplingPeer: Send + Sync {
    /// Whether the peer advertised the sampling capability for this connection.
    fn supports_sampling(&self) -> bool;

    async fn create_message(&self, request: SamplingRequest)
        -> Result<SampledContent, SamplingError>;
}

/// Ask the peer for a completion.
///
/// Short-circuits with [`SamplingError::Unsupported`] when `capability_available`
/// is false. Any other failure is logged locally and reported to the invoker as
/// a WARNING notification before being returned.
///
/// # Errors
///
/// Returns the reason no usable text was obtained.
pub async fn request_sample<P, N>(
    peer: &P,
    notifier: &N,
    request: SamplingRequest,
    capability_available: bool,
) -> Result<SamplingResponse, SamplingError>
where
    P: SamplingPeer + ?Sized,
    N: Notifier + ?Sized,
{
    if !capability_available {
        return Err(SamplingError::Unsupported);
    }

    debug!(prompt = %request.user_message, "sampling prompt");

    let outcome = match peer.create_message(request).await {
        Ok(SampledContent::Text(text)) => Ok(SamplingResponse { text }),
        Ok(SampledContent::Other(kind)) => Err(SamplingError::NoText(kind)),
        Err(err) => Err(err),
    };

    match outcome {
        Ok(response) => {
            info!("received sampling response");
            Ok(response)
        }
        Err(err) => {
            warn!(error = %err, "sampling failed; falling back to default text");
            emit_log(
                notifier,
                LogSeverity::Warning,
                format!("Sampling failed, falling back to default text: {err}"),
            )
            .await;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{LogEvent, NotifyError, ProgressEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedPeer {
        reply: Mutex<Option<Result<SampledContent, SamplingError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedPeer {
        fn new(reply: Result<SampledContent, SamplingError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SamplingPeer for ScriptedPeer {
        fn supports_sampling(&self) -> bool {
            true
        }

        async fn create_message(
            &self,
            _request: SamplingRequest,
        ) -> Result<SampledContent, SamplingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(SamplingError::Peer("no scripted reply".into())))
        }
    }

    #[derive(Default)]
    struct Logs(Mutex<Vec<LogEvent>>);

    #[async_trait]
    impl Notifier for Logs {
        async fn progress(&self, _event: ProgressEvent) -> Result<(), NotifyError> {
            Ok(())
        }

        async fn log(&self, event: LogEvent) -> Result<(), NotifyError> {
            self.0.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn request() -> SamplingRequest {
        SamplingRequest {
            system_prompt: "You are a poet!".into(),
            user_message: "Write about rain".into(),
            model_hints: vec!["zhipuai".into()],
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn test_unsupported_never_calls_peer() {
        let peer = ScriptedPeer::new(Ok(SampledContent::Text("unused".into())));
        let logs = Logs::default();

        let result = request_sample(&peer, &logs, request(), false).await;

        assert!(matches!(result, Err(SamplingError::Unsupported)));
        assert_eq!(peer.calls.load(Ordering::SeqCst), 0);
        assert!(logs.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_text_response_is_returned() {
        let peer = ScriptedPeer::new(Ok(SampledContent::Text("A sonnet...".into())));
        let logs = Logs::default();

        let result = request_sample(&peer, &logs, request(), true).await.unwrap();

        assert_eq!(result.text, "A sonnet...");
        assert!(logs.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_peer_failure_emits_warning() {
        let peer = ScriptedPeer::new(Err(SamplingError::Peer("connection reset".into())));
        let logs = Logs::default();

        let result = request_sample(&peer, &logs, request(), true).await;

        assert!(matches!(result, Err(SamplingError::Peer(_))));
        let logs = logs.0.lock().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].severity, LogSeverity::Warning);
        assert!(logs[0].message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_non_text_content_takes_failure_path() {
        let peer = ScriptedPeer::new(Ok(SampledContent::Other("image".into())));
        let logs = Logs::default();

        let result = request_sample(&peer, &logs, request(), true).await;

        assert!(matches!(result, Err(SamplingError::NoText(ref kind)) if kind == "image"));
        assert_eq!(logs.0.lock().unwrap()[0].severity, LogSeverity::Warning);
    }
}
