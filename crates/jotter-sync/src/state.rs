//! Connection state machine.
//!
//! ```text
//! Connecting --Opened--> Connected --Lost--> Disconnected
//!     ^   \                                      |
//!     |    `--Lost--> Disconnected          RetryScheduled
//!     |                                          v
//!     `------------DelayElapsed------------ Reconnecting
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Reconnecting,
}

/// Something that happened to the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSignal {
    /// The stream responded successfully.
    Opened,
    /// The request failed, or the open stream errored or ended.
    Lost,
    /// A reconnect delay has started.
    RetryScheduled,
    /// The reconnect delay is over.
    DelayElapsed,
}

impl SyncState {
    /// Next state after `signal`. Signals that do not apply leave the state unchanged.
    pub fn next(self, signal: SyncSignal) -> SyncState {
        use SyncSignal::*;
        use SyncState::*;

        match (self, signal) {
            (Connecting, Opened) => Connected,
            (Connecting | Connected, Lost) => Disconnected,
            (Disconnected, RetryScheduled) => Reconnecting,
            (Reconnecting, DelayElapsed) => Connecting,
            (state, _) => state,
        }
    }

    pub fn is_connected(self) -> bool {
        self == SyncState::Connected
    }
}
