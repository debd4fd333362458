//! Change events and the per-user listener registry.
//!
//! Database triggers publish a small JSON payload on a per-user
//! LISTEN/NOTIFY channel whenever a user's row changes. The notifier in
//! `jotter-db` parses those payloads into [`ChangeEvent`]s and hands them to
//! a [`ChangeHub`], which fans each event out to the callbacks registered
//! for that user (one per open sync stream).
//!
//! ## Payload
//!
//! ```text
//! {"operation":"UPDATE","table":"todos","id":"0192...","date":"2026-10-16"}
//! ```
//!
//! `date` is null for rows that do not belong to a calendar day.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::field;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::logging::{COMPONENT, DB_TABLE, LISTENER_COUNT, OPERATION, SUBSYSTEM, USER_ID};

/// Prefix shared by every per-user notification channel.
pub const CHANNEL_PREFIX: &str = "user_changes_";

/// Name of the LISTEN/NOTIFY channel carrying a user's changes.
///
/// Uses the hyphen-free UUID form so the name is a plain identifier.
pub fn user_channel(user_id: Uuid) -> String {
    format!("{}{}", CHANNEL_PREFIX, user_id.simple())
}

/// Inverse of [`user_channel`].
pub fn user_from_channel(channel: &str) -> Option<Uuid> {
    channel
        .strip_prefix(CHANNEL_PREFIX)
        .and_then(|rest| Uuid::try_parse(rest).ok())
}

/// Row operation reported by the trigger (`TG_OP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

/// A single row change for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub operation: ChangeOperation,
    pub table: String,
    pub id: Uuid,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl ChangeEvent {
    /// Parse a raw NOTIFY payload.
    pub fn from_payload(payload: &str) -> Result<Self> {
        serde_json::from_str(payload)
            .map_err(|e| Error::Serialization(format!("invalid change payload: {}", e)))
    }
}

/// Callback invoked for every change on a user's channel.
pub type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
struct HubInner {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<Uuid, HashMap<u64, Listener>>>,
}

impl HubInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, HashMap<u64, Listener>>> {
        // Listeners never run under this lock, so a poisoned map is still consistent.
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, user_id: Uuid, listener_id: u64) {
        let mut map = self.lock();
        if let Some(user_listeners) = map.get_mut(&user_id) {
            user_listeners.remove(&listener_id);
            if user_listeners.is_empty() {
                map.remove(&user_id);
            }
        }
    }
}

/// Registry of change listeners keyed by user.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone, Default)]
pub struct ChangeHub {
    inner: Arc<HubInner>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `user_id`'s changes.
    ///
    /// Delivery stops when the returned [`Subscription`] is dropped or
    /// explicitly unsubscribed.
    pub fn subscribe<F>(&self, user_id: Uuid, listener: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let count = {
            let mut map = self.inner.lock();
            let user_listeners = map.entry(user_id).or_default();
            user_listeners.insert(id, Arc::new(listener));
            user_listeners.len()
        };

        tracing::debug!(
            { SUBSYSTEM } = "sync",
            { COMPONENT } = "hub",
            { OPERATION } = "subscribe",
            { USER_ID } = field::display(user_id),
            { LISTENER_COUNT } = count,
            "Change listener registered"
        );

        Subscription {
            hub: Arc::downgrade(&self.inner),
            user_id,
            id,
        }
    }

    /// Deliver `event` to every listener registered for `user_id`.
    ///
    /// Each listener is isolated: a panic is logged and the remaining
    /// listeners still receive the event. Returns the number of listeners
    /// that completed normally.
    pub fn dispatch(&self, user_id: Uuid, event: &ChangeEvent) -> usize {
        let snapshot: Vec<(u64, Listener)> = match self.inner.lock().get(&user_id) {
            Some(user_listeners) => user_listeners
                .iter()
                .map(|(id, l)| (*id, Arc::clone(l)))
                .collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for (listener_id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(()) => delivered += 1,
                Err(_) => tracing::error!(
                    { SUBSYSTEM } = "sync",
                    { COMPONENT } = "hub",
                    { USER_ID } = field::display(user_id),
                    listener_id,
                    { DB_TABLE } = event.table.as_str(),
                    "Change listener panicked"
                ),
            }
        }

        tracing::trace!(
            { SUBSYSTEM } = "sync",
            { COMPONENT } = "hub",
            { OPERATION } = "dispatch",
            { USER_ID } = field::display(user_id),
            { DB_TABLE } = event.table.as_str(),
            { LISTENER_COUNT } = delivered,
            "Change dispatched"
        );
        delivered
    }

    /// Number of listeners currently registered for `user_id`.
    pub fn listener_count(&self, user_id: Uuid) -> usize {
        self.inner.lock().get(&user_id).map_or(0, HashMap::len)
    }

    /// Number of users with at least one listener.
    pub fn user_count(&self) -> usize {
        self.inner.lock().len()
    }
}

/// Handle for a registered listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    hub: Weak<HubInner>,
    user_id: Uuid,
    id: u64,
}

impl Subscription {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Remove the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            inner.remove(self.user_id, self.id);
            tracing::debug!(
                { SUBSYSTEM } = "sync",
                { COMPONENT } = "hub",
                { OPERATION } = "unsubscribe",
                { USER_ID } = field::display(self.user_id),
                "Change listener removed"
            );
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("user_id", &self.user_id)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn event(table: &str) -> ChangeEvent {
        ChangeEvent {
            operation: ChangeOperation::Update,
            table: table.to_string(),
            id: Uuid::now_v7(),
            date: NaiveDate::from_ymd_opt(2026, 10, 16),
        }
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&ChangeEvent) + Send + Sync + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        (hits, move |_: &ChangeEvent| {
            h.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn channel_name_round_trips() {
        let user = Uuid::now_v7();
        let channel = user_channel(user);
        assert!(channel.starts_with(CHANNEL_PREFIX));
        assert!(!channel.contains('-'));
        assert!(channel.len() <= 63, "postgres identifiers are limited to 63 bytes");
        assert_eq!(user_from_channel(&channel), Some(user));
        assert_eq!(user_from_channel("other_channel"), None);
        assert_eq!(user_from_channel("user_changes_nothex"), None);
    }

    #[test]
    fn parses_trigger_payload() {
        let id = Uuid::now_v7();
        let payload = format!(
            r#"{{"operation":"INSERT","table":"todos","id":"{}","date":"2026-10-16"}}"#,
            id
        );
        let event = ChangeEvent::from_payload(&payload).unwrap();
        assert_eq!(event.operation, ChangeOperation::Insert);
        assert_eq!(event.table, "todos");
        assert_eq!(event.id, id);
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2026, 10, 16));
    }

    #[test]
    fn parses_payload_with_null_or_missing_date() {
        let id = Uuid::now_v7();
        let with_null = format!(
            r#"{{"operation":"DELETE","table":"note_folders","id":"{}","date":null}}"#,
            id
        );
        let without = format!(r#"{{"operation":"UPDATE","table":"projects","id":"{}"}}"#, id);
        assert!(ChangeEvent::from_payload(&with_null).unwrap().date.is_none());
        assert!(ChangeEvent::from_payload(&without).unwrap().date.is_none());
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(ChangeEvent::from_payload("not json").is_err());
        assert!(ChangeEvent::from_payload(r#"{"operation":"TRUNCATE","table":"t","id":"x"}"#)
            .is_err());
        assert!(ChangeEvent::from_payload(r#"{"table":"todos"}"#).is_err());
    }

    #[test]
    fn events_reach_only_the_owning_user() {
        let hub = ChangeHub::new();
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        let (alice_hits, alice_fn) = counter();
        let (bob_hits, bob_fn) = counter();
        let _a = hub.subscribe(alice, alice_fn);
        let _b = hub.subscribe(bob, bob_fn);

        assert_eq!(hub.dispatch(alice, &event("todos")), 1);
        assert_eq!(hub.dispatch(alice, &event("notes")), 1);

        assert_eq!(alice_hits.load(Ordering::SeqCst), 2);
        assert_eq!(bob_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_only_affects_that_listener() {
        let hub = ChangeHub::new();
        let user = Uuid::now_v7();
        let (first_hits, first_fn) = counter();
        let (second_hits, second_fn) = counter();
        let first = hub.subscribe(user, first_fn);
        let _second = hub.subscribe(user, second_fn);
        assert_eq!(hub.listener_count(user), 2);

        hub.dispatch(user, &event("todos"));
        first.unsubscribe();
        hub.dispatch(user, &event("todos"));

        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 2);
        assert_eq!(hub.listener_count(user), 1);
    }

    #[test]
    fn dropping_last_subscription_forgets_user() {
        let hub = ChangeHub::new();
        let user = Uuid::now_v7();
        {
            let _sub = hub.subscribe(user, |_| {});
            assert_eq!(hub.user_count(), 1);
        }
        assert_eq!(hub.user_count(), 0);
        assert_eq!(hub.dispatch(user, &event("todos")), 0);
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let hub = ChangeHub::new();
        let user = Uuid::now_v7();
        let (hits, ok_fn) = counter();
        let _bad = hub.subscribe(user, |_| panic!("listener failure"));
        let _good = hub.subscribe(user, ok_fn);

        let delivered = hub.dispatch(user, &event("todos"));

        assert_eq!(delivered, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        // The failing listener stays registered; only its call was isolated.
        assert_eq!(hub.listener_count(user), 2);
    }

    #[test]
    fn subscription_outliving_hub_is_harmless() {
        let hub = ChangeHub::new();
        let sub = hub.subscribe(Uuid::now_v7(), |_| {});
        drop(hub);
        sub.unsubscribe();
    }

    #[test]
    fn listener_may_subscribe_during_dispatch() {
        let hub = ChangeHub::new();
        let user = Uuid::now_v7();
        let inner_hub = hub.clone();
        let spawned = Arc::new(Mutex::new(Vec::new()));
        let spawned_clone = Arc::clone(&spawned);
        let _sub = hub.subscribe(user, move |_| {
            let s = inner_hub.subscribe(user, |_| {});
            spawned_clone.lock().unwrap().push(s);
        });

        hub.dispatch(user, &event("todos"));
        assert_eq!(hub.listener_count(user), 2);
    }
}
