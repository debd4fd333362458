//! Repository traits.
//!
//! Every method takes the owning `user_id`; rows belonging to other users
//! behave exactly like missing rows.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// USERS & SESSIONS
// =============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user, or return the existing one with that email.
    async fn upsert_by_email(&self, email: &str, name: Option<&str>) -> Result<User>;

    async fn get(&self, id: Uuid) -> Result<Option<User>>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Issue a new session token valid for `ttl`.
    async fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<IssuedSession>;

    /// Resolve a raw token to a live session.
    async fn validate(&self, token: &str) -> Result<Option<Session>>;

    /// Revoke a token. Unknown tokens are ignored.
    async fn revoke(&self, token: &str) -> Result<()>;
}

// =============================================================================
// TODOS
// =============================================================================

#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Create a todo at the end of its day.
    async fn create(&self, user_id: Uuid, req: CreateTodoRequest) -> Result<Todo>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Todo>;

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateTodoRequest) -> Result<Todo>;

    /// Mark complete or incomplete, maintaining `completed_at`.
    async fn set_completed(&self, user_id: Uuid, id: Uuid, completed: bool) -> Result<Todo>;

    /// Flip completion state.
    async fn toggle(&self, user_id: Uuid, id: Uuid) -> Result<Todo>;

    async fn soft_delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;

    async fn restore(&self, user_id: Uuid, id: Uuid) -> Result<Todo>;

    /// Apply a drag-and-drop order: `ordered_ids[i]` gets position `i`.
    /// Every id must be a live todo on `date`.
    async fn reorder(&self, user_id: Uuid, date: NaiveDate, ordered_ids: &[Uuid]) -> Result<()>;

    /// Copy a todo (content, priority) to another day as a new incomplete todo.
    async fn copy_to_date(&self, user_id: Uuid, id: Uuid, date: NaiveDate) -> Result<Todo>;

    async fn list_for_date(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<Todo>>;

    /// Incomplete live todos dated before `date`, newest day first.
    async fn list_unfinished_before(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<Todo>>;
}

// =============================================================================
// NOTES & FOLDERS
// =============================================================================

#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, req: CreateNoteRequest) -> Result<Note>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Note>;

    /// Look up a generic note by its slug within a folder (None = root).
    async fn get_by_slug(&self, user_id: Uuid, folder_id: Option<Uuid>, slug: &str)
        -> Result<Note>;

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateNoteRequest) -> Result<Note>;

    /// Move a generic note to another folder (None = root); its slug is
    /// re-derived if it clashes in the destination.
    async fn move_to_folder(&self, user_id: Uuid, id: Uuid, folder_id: Option<Uuid>)
        -> Result<Note>;

    async fn soft_delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;

    async fn restore(&self, user_id: Uuid, id: Uuid) -> Result<Note>;

    async fn list_for_date(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<Note>>;

    async fn list_in_folder(&self, user_id: Uuid, folder_id: Option<Uuid>) -> Result<Vec<Note>>;

    /// Soft-deleted notes, most recently deleted first.
    async fn list_trash(&self, user_id: Uuid) -> Result<Vec<Note>>;
}

#[async_trait]
pub trait FolderRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, req: CreateFolderRequest) -> Result<NoteFolder>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<NoteFolder>;

    /// Rename, re-deriving the slug within the current parent.
    async fn rename(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<NoteFolder>;

    /// Re-parent a folder. Rejects moves under itself or a descendant.
    async fn move_to(&self, user_id: Uuid, id: Uuid, parent_id: Option<Uuid>)
        -> Result<NoteFolder>;

    /// Delete the folder and its subtree; notes inside are soft-deleted.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;

    /// Whole tree, depth-first in position order.
    async fn list_tree(&self, user_id: Uuid) -> Result<Vec<NoteFolder>>;
}

// =============================================================================
// PROJECTS, TAGS, COMMENTS
// =============================================================================

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, req: CreateProjectRequest) -> Result<Project>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Project>;

    async fn list(&self, user_id: Uuid, include_archived: bool) -> Result<Vec<Project>>;

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateProjectRequest)
        -> Result<Project>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;

    /// Assign an item to a project. Idempotent.
    async fn assign(&self, user_id: Uuid, project_id: Uuid, item: ItemRef) -> Result<()>;

    async fn unassign(&self, user_id: Uuid, project_id: Uuid, item: ItemRef) -> Result<()>;

    /// Live items assigned to the project.
    async fn items(&self, user_id: Uuid, project_id: Uuid) -> Result<ItemCollection>;
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Tags with live mention counts, by name.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>>;

    /// Rename a tag. Fails with a conflict if the new name is taken.
    async fn rename(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Tag>;

    /// Delete a tag and its mentions (content is left untouched).
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;

    /// Live items mentioning the tag.
    async fn items(&self, user_id: Uuid, id: Uuid) -> Result<ItemCollection>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, target: CommentTarget, content: &str)
        -> Result<Comment>;

    async fn list_for(&self, user_id: Uuid, target: CommentTarget) -> Result<Vec<Comment>>;

    async fn update(&self, user_id: Uuid, id: Uuid, content: &str) -> Result<Comment>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Stored settings, or defaults if the user never saved any.
    async fn get(&self, user_id: Uuid) -> Result<UserSettings>;

    async fn update(&self, user_id: Uuid, req: UpdateSettingsRequest) -> Result<UserSettings>;
}
