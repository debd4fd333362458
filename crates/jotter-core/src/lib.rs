//! # jotter-core
//!
//! Core types, traits, and abstractions for jotter.
//!
//! This crate provides the domain models, repository trait definitions,
//! change-event types with the per-user [`ChangeHub`] registry, and the
//! small text helpers (slugs, `[[tag]]` mentions) shared by the other
//! crates.

pub mod error;
pub mod events;
pub mod logging;
pub mod mentions;
pub mod models;
pub mod slug;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{
    user_channel, user_from_channel, ChangeEvent, ChangeHub, ChangeOperation, Listener,
    Subscription,
};
pub use mentions::{extract_mentions, validate_tag_name};
pub use models::*;
pub use slug::{slugify, unique_slug};
pub use traits::*;
