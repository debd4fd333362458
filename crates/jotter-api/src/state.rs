use std::sync::Arc;
use std::time::Duration;

use jotter_db::{ChangeNotifier, Database};

use crate::config::ApiConfig;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Process-wide LISTEN/NOTIFY fan-out feeding sync streams.
    pub notifier: Arc<ChangeNotifier>,
    pub sync_keepalive: Duration,
}

impl AppState {
    pub fn new(db: Database, notifier: Arc<ChangeNotifier>, config: &ApiConfig) -> Self {
        Self {
            db,
            notifier,
            sync_keepalive: config.sync_keepalive,
        }
    }
}
