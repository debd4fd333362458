//! REST handlers.
//!
//! Every handler except [`health`] requires a session; rows belonging to
//! other users behave as not found.

pub mod account;
pub mod comments;
pub mod days;
pub mod folders;
pub mod health;
pub mod notes;
pub mod projects;
pub mod search;
pub mod settings;
pub mod tags;
pub mod todos;

use uuid::Uuid;

use jotter_core::ItemRef;

use crate::ApiError;

/// Parse an item reference from a `:kind/:id` path pair.
pub(crate) fn item_ref(kind: &str, id: Uuid) -> Result<ItemRef, ApiError> {
    match kind {
        "note" | "notes" => Ok(ItemRef::Note(id)),
        "todo" | "todos" => Ok(ItemRef::Todo(id)),
        "comment" | "comments" => Ok(ItemRef::Comment(id)),
        other => Err(ApiError::BadRequest(format!("Unknown item kind: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_ref_accepts_singular_and_plural() {
        let id = Uuid::nil();
        assert_eq!(item_ref("todo", id).unwrap(), ItemRef::Todo(id));
        assert_eq!(item_ref("notes", id).unwrap(), ItemRef::Note(id));
        assert_eq!(item_ref("comment", id).unwrap(), ItemRef::Comment(id));
        assert!(matches!(item_ref("folder", id), Err(ApiError::BadRequest(_))));
    }
}
