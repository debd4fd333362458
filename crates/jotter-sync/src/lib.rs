//! # jotter-sync
//!
//! Client side of jotter's live sync.
//!
//! [`SyncClient`] follows the server's `/api/sync` Server-Sent Events
//! stream and invokes a refresh callback whenever another session changes
//! one of the user's rows. Connection state is tracked by the small
//! [`SyncState`] machine and published through a `tokio::sync::watch`
//! channel on the returned [`SyncHandle`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use jotter_sync::{Refresh, SyncClient, SyncClientConfig};
//!
//! let handle = SyncClient::spawn(
//!     SyncClientConfig::new("https://jotter.app", token),
//!     |refresh| match refresh {
//!         Refresh::Change(change) => reload_table(&change.table),
//!         Refresh::Reconnected => reload_everything(),
//!     },
//! )?;
//! ```

pub mod client;
pub mod sse;
pub mod state;

pub use client::{
    Refresh, RefreshFn, SyncClient, SyncClientConfig, SyncError, SyncHandle,
    DEFAULT_READ_TIMEOUT, DEFAULT_RECONNECT_DELAY, SYNC_PATH,
};
pub use sse::{SseError, SseEvent, SseParser, MAX_LINE_BYTES};
pub use state::{SyncSignal, SyncState};
