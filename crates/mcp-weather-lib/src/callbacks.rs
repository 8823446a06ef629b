//! Client-side handlers for notifications and sampling requests coming from
//! an upstream MCP server.
//!
//! Handlers are registered explicitly in a [`CallbackRegistry`] keyed by the
//! upstream peer's name and the kind of callback; the MCP client service looks
//! them up whenever something arrives from that peer.
//!
//! Construction is two-phase. [`ClientCallbacks::new`] creates the handlers
//! without a chat backend so they can be registered before anything else
//! exists; [`ClientCallbacks::bind_backend`] wires the backend in afterwards.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

use crate::chat::{ChatBackend, ChatError};
use crate::notify::{LogEvent, ProgressEvent};
use crate::sampling::SamplingResponse;

/// Peer name the client registers its handlers under unless told otherwise.
pub const DEFAULT_PEER_NAME: &str = "my-weather-server";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    Progress,
    Logging,
    Sampling,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CallbackKind::Progress => "progress",
            CallbackKind::Logging => "logging",
            CallbackKind::Sampling => "sampling",
        })
    }
}

/// A sampling request as received from the wire. Every piece may be missing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IncomingSamplingRequest {
    pub system_prompt: Option<String>,
    pub messages: Vec<IncomingMessage>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IncomingMessage {
    pub role: Option<String>,
    /// Text of the message; `None` if absent or if the content is not text.
    pub text: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("no {kind} handler registered for peer `{peer}`")]
    NotRegistered { peer: String, kind: CallbackKind },
    #[error("chat backend has not been bound")]
    Unbound,
    #[error("chat backend already bound")]
    AlreadyBound,
    #[error("chat backend failed: {0}")]
    Backend(#[from] ChatError),
}

pub type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;
pub type LoggingCallback = Arc<dyn Fn(&LogEvent) + Send + Sync>;
pub type SamplingCallback = Arc<
    dyn Fn(IncomingSamplingRequest) -> BoxFuture<'static, Result<SamplingResponse, CallbackError>>
        + Send
        + Sync,
>;

/// Mapping from (peer name, callback kind) to handler.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    progress: HashMap<String, ProgressCallback>,
    logging: HashMap<String, LoggingCallback>,
    sampling: HashMap<String, SamplingCallback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress<F>(&mut self, peer: &str, handler: F) -> &mut Self
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.progress.insert(peer.to_string(), Arc::new(handler));
        self
    }

    pub fn on_logging<F>(&mut self, peer: &str, handler: F) -> &mut Self
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        self.logging.insert(peer.to_string(), Arc::new(handler));
        self
    }

    pub fn on_sampling<F, Fut>(&mut self, peer: &str, handler: F) -> &mut Self
    where
        F: Fn(IncomingSamplingRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SamplingResponse, CallbackError>> + Send + 'static,
    {
        let handler: SamplingCallback = Arc::new(move |request| handler(request).boxed());
        self.sampling.insert(peer.to_string(), handler);
        self
    }

    pub fn is_registered(&self, peer: &str, kind: CallbackKind) -> bool {
        match kind {
            CallbackKind::Progress => self.progress.contains_key(peer),
            CallbackKind::Logging => self.logging.contains_key(peer),
            CallbackKind::Sampling => self.sampling.contains_key(peer),
        }
    }

    /// Deliver a progress event. Returns `false` when no handler is registered for `peer`.
    pub fn dispatch_progress(&self, peer: &str, event: &ProgressEvent) -> bool {
        match self.progress.get(peer) {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    /// Deliver a log event. Returns `false` when no handler is registered for `peer`.
    pub fn dispatch_logging(&self, peer: &str, event: &LogEvent) -> bool {
        match self.logging.get(peer) {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    /// Hand a sampling request to the handler registered for `peer`.
    ///
    /// # Errors
    ///
    /// [`CallbackError::NotRegistered`] if nothing handles sampling for `peer`;
    /// otherwise whatever the handler returns, unchanged.
    pub async fn dispatch_sampling(
        &self,
        peer: &str,
        request: IncomingSamplingRequest,
    ) -> Result<SamplingResponse, CallbackError> {
        let handler = self
            .sampling
            .get(peer)
            .cloned()
            .ok_or_else(|| CallbackError::NotRegistered {
                peer: peer.to_string(),
                kind: CallbackKind::Sampling,
            })?;
        handler(request).await
    }
}

/// The three client-side handlers: progress display, log display and sampling.
#[derive(Default)]
pub struct ClientCallbacks {
    backend: OnceLock<Arc<dyn ChatBackend>>,
}

impl ClientCallbacks {
    /// Phase one: handlers without a chat backend.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Phase two: attach the chat backend used for sampling.
    ///
    /// # Errors
    ///
    /// [`CallbackError::AlreadyBound`] if a backend was bound before.
    pub fn bind_backend(&self, backend: Arc<dyn ChatBackend>) -> Result<(), CallbackError> {
        self.backend
            .set(backend)
            .map_err(|_| CallbackError::AlreadyBound)
    }

    /// Register all three handlers for `peer`.
    pub fn register(self: &Arc<Self>, registry: &mut CallbackRegistry, peer: &str) {
        let sampler = Arc::clone(self);
        registry
            .on_progress(peer, Self::handle_progress)
            .on_logging(peer, Self::handle_logging)
            .on_sampling(peer, move |request| {
                let sampler = Arc::clone(&sampler);
                async move { sampler.handle_sampling(request).await }
            });
    }

    pub fn handle_progress(event: &ProgressEvent) {
        let token = event
            .token
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "none".to_string());
        info!(
            "MCP PROGRESS: [{}] progress: {} total: {} message: {}",
            token, event.completed, event.total, event.label
        );
    }

    pub fn handle_logging(event: &LogEvent) {
        info!("MCP LOGGING: [{}] {}", event.severity, event.message);
    }

    /// Answer a sampling request with the bound chat backend.
    ///
    /// Missing system prompt, missing first message and missing or non-text
    /// message content all become empty strings, as does an empty backend
    /// answer. Backend failures are returned as-is.
    ///
    /// # Errors
    ///
    /// [`CallbackError::Unbound`] before [`bind_backend`](Self::bind_backend),
    /// [`CallbackError::Backend`] when the chat backend fails.
    pub async fn handle_sampling(
        &self,
        request: IncomingSamplingRequest,
    ) -> Result<SamplingResponse, CallbackError> {
        info!(?request, "MCP SAMPLING");

        let system_prompt = request.system_prompt.unwrap_or_default();
        let user_text = request
            .messages
            .into_iter()
            .next()
            .and_then(|m| m.text)
            .unwrap_or_default();

        let backend = self.backend.get().ok_or(CallbackError::Unbound)?;
        let answer = backend.complete(&system_prompt, &user_text).await?;

        Ok(SamplingResponse {
            text: answer.unwrap_or_default(),
        })
    }
}
