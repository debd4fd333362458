//! Column lists, row mappers and `[[tag]]` mention syncing shared by the
//! todo, note and comment repositories.

use sqlx::{postgres::PgRow, Postgres, Row, Transaction};
use uuid::Uuid;

use jotter_core::{
    extract_mentions, Comment, CommentTarget, Error, ItemRef, Note, NoteKind, Result, Todo,
};

/// Todo columns, aliased `t`, including computed tags and projects.
pub(crate) const TODO_COLUMNS: &str = r#"
    t.id, t.user_id, t.date, t.content, t.priority, t.completed, t.completed_at,
    t.position, t.copied_from_id, t.created_at, t.updated_at, t.deleted_at,
    ARRAY(
        SELECT tg.name FROM tag_mentions tm JOIN tags tg ON tg.id = tm.tag_id
        WHERE tm.todo_id = t.id ORDER BY lower(tg.name)
    ) AS tags,
    ARRAY(SELECT pa.project_id FROM project_assignments pa WHERE pa.todo_id = t.id) AS project_ids
"#;

/// Note columns, aliased `n`.
pub(crate) const NOTE_COLUMNS: &str = r#"
    n.id, n.user_id, n.kind, n.date, n.folder_id, n.title, n.slug, n.content,
    n.position, n.created_at, n.updated_at, n.deleted_at,
    ARRAY(
        SELECT tg.name FROM tag_mentions tm JOIN tags tg ON tg.id = tm.tag_id
        WHERE tm.note_id = n.id ORDER BY lower(tg.name)
    ) AS tags,
    ARRAY(SELECT pa.project_id FROM project_assignments pa WHERE pa.note_id = n.id) AS project_ids
"#;

/// Comment columns, aliased `c`.
pub(crate) const COMMENT_COLUMNS: &str = r#"
    c.id, c.user_id, c.todo_id, c.note_id, c.content, c.created_at, c.updated_at,
    ARRAY(
        SELECT tg.name FROM tag_mentions tm JOIN tags tg ON tg.id = tm.tag_id
        WHERE tm.comment_id = c.id ORDER BY lower(tg.name)
    ) AS tags
"#;

pub(crate) fn todo_from_row(row: &PgRow) -> Result<Todo> {
    let priority: String = row.get("priority");
    Ok(Todo {
        id: row.get("id"),
        user_id: row.get("user_id"),
        date: row.get("date"),
        content: row.get("content"),
        priority: priority.parse()?,
        completed: row.get("completed"),
        completed_at: row.get("completed_at"),
        position: row.get("position"),
        copied_from_id: row.get("copied_from_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
        tags: row.get("tags"),
        project_ids: row.get("project_ids"),
    })
}

pub(crate) fn note_from_row(row: &PgRow) -> Result<Note> {
    let kind: String = row.get("kind");
    Ok(Note {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind: kind.parse::<NoteKind>()?,
        date: row.get("date"),
        folder_id: row.get("folder_id"),
        title: row.get("title"),
        slug: row.get("slug"),
        content: row.get("content"),
        position: row.get("position"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
        tags: row.get("tags"),
        project_ids: row.get("project_ids"),
    })
}

pub(crate) fn comment_from_row(row: &PgRow) -> Result<Comment> {
    let todo_id: Option<Uuid> = row.get("todo_id");
    let note_id: Option<Uuid> = row.get("note_id");
    let target = match (todo_id, note_id) {
        (Some(id), None) => CommentTarget::Todo(id),
        (None, Some(id)) => CommentTarget::Note(id),
        _ => {
            return Err(Error::Internal(
                "Comment must reference exactly one todo or note".into(),
            ))
        }
    };
    Ok(Comment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        target,
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        tags: row.get("tags"),
    })
}

pub(crate) fn todos_from_rows(rows: &[PgRow]) -> Result<Vec<Todo>> {
    rows.iter().map(todo_from_row).collect()
}

pub(crate) fn notes_from_rows(rows: &[PgRow]) -> Result<Vec<Note>> {
    rows.iter().map(note_from_row).collect()
}

pub(crate) fn comments_from_rows(rows: &[PgRow]) -> Result<Vec<Comment>> {
    rows.iter().map(comment_from_row).collect()
}

/// Replace the tag mentions of `item` with those found in `content`,
/// creating missing tags for `user_id`.
pub(crate) async fn sync_mentions(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    item: ItemRef,
    content: &str,
) -> Result<()> {
    let column = item.column();

    sqlx::query(&format!("DELETE FROM tag_mentions WHERE {} = $1", column))
        .bind(item.id())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

    for name in extract_mentions(content) {
        // Insert only when missing so unchanged tags do not emit change events.
        sqlx::query(
            "INSERT INTO tags (id, user_id, name) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(&name)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        let tag_id: Uuid =
            sqlx::query_scalar("SELECT id FROM tags WHERE user_id = $1 AND lower(name) = lower($2)")
                .bind(user_id)
                .bind(&name)
                .fetch_one(&mut **tx)
                .await
                .map_err(Error::Database)?;

        sqlx::query(&format!(
            "INSERT INTO tag_mentions (id, tag_id, {}) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
            column
        ))
        .bind(Uuid::now_v7())
        .bind(tag_id)
        .bind(item.id())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
    }

    Ok(())
}

/// Check that a live todo or note belongs to the user.
pub(crate) async fn ensure_item_owned(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    item: ItemRef,
) -> Result<()> {
    let live = match item {
        ItemRef::Comment(_) => "",
        _ => " AND deleted_at IS NULL",
    };
    let exists: bool = sqlx::query_scalar(&format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1 AND user_id = $2{})",
        item.table(),
        live
    ))
    .bind(item.id())
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(Error::Database)?;

    if !exists {
        let entity = match item {
            ItemRef::Note(_) => "Note",
            ItemRef::Todo(_) => "Todo",
            ItemRef::Comment(_) => "Comment",
        };
        return Err(Error::not_found(entity, item.id()));
    }
    Ok(())
}

/// Turn a unique violation into a user-facing conflict.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> Error {
    let err = Error::Database(err);
    if err.is_unique_violation() {
        Error::Conflict(message.into())
    } else {
        err
    }
}

/// Reject blank text content.
pub(crate) fn require_content(entity: &str, content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} content cannot be empty", entity)));
    }
    Ok(())
}
