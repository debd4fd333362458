//! Live sync stream (`GET /api/sync`).
//!
//! Each connection subscribes to the change notifier for the session's user
//! and forwards every change as an SSE `change` event. The stream opens with
//! a `connected` event and carries a `: ping` comment at the keep-alive
//! interval.
//!
//! ```text
//! event: connected
//! data: {"type":"connected"}
//!
//! event: change
//! data: {"type":"change","operation":"UPDATE","table":"todos","id":"…","date":"2026-10-16"}
//!
//! : ping
//! ```
//!
//! Dropping the response stream (client disconnect) drops the
//! [`Subscription`], which unregisters the listener.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use jotter_core::{ChangeEvent, Subscription};

use crate::auth::RequireUser;
use crate::{ApiError, AppState};

/// Keep-alive comment text.
pub const KEEPALIVE_TEXT: &str = "ping";

/// Message sent to sync clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyncMessage {
    Connected,
    Change(ChangeEvent),
}

impl SyncMessage {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            SyncMessage::Connected => "connected",
            SyncMessage::Change(_) => "change",
        }
    }

    fn to_event(&self) -> Option<Event> {
        match serde_json::to_string(self) {
            Ok(json) => Some(Event::default().event(self.name()).data(json)),
            Err(e) => {
                warn!(subsystem = "sync", error = %e, "Failed to encode sync message");
                None
            }
        }
    }
}

/// Event stream for one connected client.
///
/// Holds the notifier subscription for as long as the client is connected.
pub struct SyncStream {
    user_id: Uuid,
    greeting: Option<SyncMessage>,
    messages: UnboundedReceiverStream<SyncMessage>,
    _subscription: Subscription,
}

impl SyncStream {
    pub fn new(subscription: Subscription, messages: mpsc::UnboundedReceiver<SyncMessage>) -> Self {
        Self {
            user_id: subscription.user_id(),
            greeting: Some(SyncMessage::Connected),
            messages: UnboundedReceiverStream::new(messages),
            _subscription: subscription,
        }
    }
}

impl Stream for SyncStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(event) = this.greeting.take().and_then(|m| m.to_event()) {
            return Poll::Ready(Some(Ok(event)));
        }

        loop {
            match Pin::new(&mut this.messages).poll_next(cx) {
                Poll::Ready(Some(message)) => {
                    if let Some(event) = message.to_event() {
                        return Poll::Ready(Some(Ok(event)));
                    }
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for SyncStream {
    fn drop(&mut self) {
        debug!(
            subsystem = "sync",
            component = "stream",
            user_id = %self.user_id,
            "Sync stream closed"
        );
    }
}

/// Open a live change stream for the authenticated user.
///
/// # Returns
/// - 200 OK with a `text/event-stream` body
/// - 401 Unauthorized without a valid session
/// - 500 Internal Server Error if the channel cannot be listened to
pub async fn sync_events(
    State(state): State<AppState>,
    auth: RequireUser,
) -> Result<Sse<SyncStream>, ApiError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = state
        .notifier
        .subscribe(auth.user_id, move |event| {
            // The receiver is gone once the client disconnects.
            let _ = tx.send(SyncMessage::Change(event.clone()));
        })
        .await?;

    info!(
        subsystem = "sync",
        component = "stream",
        op = "open",
        user_id = %auth.user_id,
        listener_count = state.notifier.hub().listener_count(auth.user_id),
        "Sync stream opened"
    );

    Ok(Sse::new(SyncStream::new(subscription, rx)).keep_alive(
        KeepAlive::new()
            .interval(state.sync_keepalive)
            .text(KEEPALIVE_TEXT),
    ))
}
