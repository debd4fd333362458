//! Reconnecting sync stream consumer.
//!
//! Follows `GET /api/sync` and calls a refresh callback whenever the
//! server reports a change. Any error or end of stream moves the client to
//! `Disconnected`; after a fixed delay it reconnects, forever, until the
//! [`SyncHandle`] is stopped or dropped.
//!
//! Refreshes are full re-fetches: the callback only learns *that* something
//! changed (and which row), never a patch.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use jotter_core::ChangeEvent;

use crate::sse::{SseError, SseEvent, SseParser};
use crate::state::{SyncSignal, SyncState};

/// Delay between losing the stream and reconnecting.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Silence after which the stream is considered dead. Three missed
/// keep-alives at the server's default 30 s interval.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(90);

/// Path of the server's change stream.
pub const SYNC_PATH: &str = "/api/sync";

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sync stream rejected with status {0}")]
    Status(u16),
    #[error("No data from sync stream for {0:?}")]
    Idle(Duration),
    #[error(transparent)]
    Stream(#[from] SseError),
}

#[derive(Debug, Clone)]
pub struct SyncClientConfig {
    /// Server origin, e.g. `https://jotter.app`.
    pub base_url: String,
    /// Session token sent as a bearer token.
    pub token: String,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    /// Longest wait for response headers or the next body chunk. Keep it
    /// above the server's keep-alive interval.
    pub read_timeout: Duration,
}

impl SyncClientConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: Duration::from_secs(10),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    fn stream_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), SYNC_PATH)
    }
}

/// Why the client is asking for a refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh {
    /// The server reported a change.
    Change(ChangeEvent),
    /// The stream came back after a disconnect; changes may have been missed.
    Reconnected,
}

/// Callback invoked on every refresh.
pub type RefreshFn = Arc<dyn Fn(Refresh) + Send + Sync>;

/// Handle to a running sync loop. Dropping it stops the loop.
pub struct SyncHandle {
    state: watch::Receiver<SyncState>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Current connection state.
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Receiver that observes state changes.
    pub fn watch_state(&self) -> watch::Receiver<SyncState> {
        self.state.clone()
    }

    /// Stop the loop and close the stream.
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct SyncClient {
    config: SyncClientConfig,
    http: reqwest::Client,
    state: watch::Sender<SyncState>,
    on_refresh: RefreshFn,
}

impl SyncClient {
    /// Start following the change stream in a background task.
    pub fn spawn<F>(config: SyncClientConfig, on_refresh: F) -> Result<SyncHandle, SyncError>
    where
        F: Fn(Refresh) + Send + Sync + 'static,
    {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        let (state, state_rx) = watch::channel(SyncState::Connecting);

        let client = SyncClient {
            config,
            http,
            state,
            on_refresh: Arc::new(on_refresh),
        };
        let task = tokio::spawn(client.run());

        Ok(SyncHandle {
            state: state_rx,
            task,
        })
    }

    async fn run(self) {
        let mut state = SyncState::Connecting;
        let mut connected_before = false;

        loop {
            match self.open().await {
                Ok(response) => {
                    state = self.transition(state, SyncSignal::Opened);
                    if connected_before {
                        (self.on_refresh)(Refresh::Reconnected);
                    }
                    connected_before = true;

                    match self.consume(response).await {
                        Ok(()) => info!(subsystem = "sync", component = "client", "Sync stream ended"),
                        Err(e) => warn!(
                            subsystem = "sync",
                            component = "client",
                            error = %e,
                            "Sync stream failed"
                        ),
                    }
                }
                Err(e) => warn!(
                    subsystem = "sync",
                    component = "client",
                    error = %e,
                    "Could not open sync stream"
                ),
            }

            state = self.transition(state, SyncSignal::Lost);
            state = self.transition(state, SyncSignal::RetryScheduled);
            tokio::time::sleep(self.config.reconnect_delay).await;
            state = self.transition(state, SyncSignal::DelayElapsed);
        }
    }

    fn transition(&self, state: SyncState, signal: SyncSignal) -> SyncState {
        let next = state.next(signal);
        if next != state {
            debug!(
                subsystem = "sync",
                component = "client",
                from = ?state,
                to = ?next,
                "Sync state changed"
            );
            self.state.send_replace(next);
        }
        next
    }

    async fn open(&self) -> Result<reqwest::Response, SyncError> {
        let request = self
            .http
            .get(self.config.stream_url())
            .header(ACCEPT, "text/event-stream")
            .header(AUTHORIZATION, format!("Bearer {}", self.config.token))
            .send();
        let response = timeout(self.config.read_timeout, request)
            .await
            .map_err(|_| SyncError::Idle(self.config.read_timeout))??;

        if !response.status().is_success() {
            return Err(SyncError::Status(response.status().as_u16()));
        }
        Ok(response)
    }

    /// Read events until the stream errors or ends.
    async fn consume(&self, response: reqwest::Response) -> Result<(), SyncError> {
        let mut parser = SseParser::new();
        let mut body = response.bytes_stream();

        loop {
            let chunk = match timeout(self.config.read_timeout, body.next()).await {
                Ok(Some(chunk)) => chunk?,
                Ok(None) => return Ok(()),
                Err(_) => return Err(SyncError::Idle(self.config.read_timeout)),
            };
            for event in parser.push(&chunk)? {
                self.handle_event(event);
            }
        }
    }

    fn handle_event(&self, event: SseEvent) {
        match event.event.as_str() {
            "change" => match ChangeEvent::from_payload(&event.data) {
                Ok(change) => (self.on_refresh)(Refresh::Change(change)),
                Err(e) => warn!(
                    subsystem = "sync",
                    component = "client",
                    error = %e,
                    "Ignoring malformed change event"
                ),
            },
            "connected" => debug!(subsystem = "sync", component = "client", "Sync stream connected"),
            other => debug!(
                subsystem = "sync",
                component = "client",
                event = other,
                "Ignoring sync event"
            ),
        }
    }
}
