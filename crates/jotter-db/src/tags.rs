//! Tag repository implementation.
//!
//! Tags are created implicitly from `[[name]]` mentions (see
//! `items::sync_mentions`). Renaming a tag rewrites the mentions inside
//! every item that references it, so the next save does not resurrect the
//! old name.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use jotter_core::{validate_tag_name, Error, ItemCollection, Result, Tag, TagRepository};

use crate::items::{
    comments_from_rows, conflict_on_unique, notes_from_rows, todos_from_rows, COMMENT_COLUMNS,
    NOTE_COLUMNS, TODO_COLUMNS,
};

const TAG_COLUMNS: &str = r#"
    t.id, t.user_id, t.name, t.created_at,
    (
        SELECT COUNT(*) FROM tag_mentions tm
        LEFT JOIN notes n ON n.id = tm.note_id
        LEFT JOIN todos td ON td.id = tm.todo_id
        WHERE tm.tag_id = t.id
          AND (
              tm.comment_id IS NOT NULL
              OR (tm.note_id IS NOT NULL AND n.deleted_at IS NULL)
              OR (tm.todo_id IS NOT NULL AND td.deleted_at IS NULL)
          )
    ) AS mention_count
"#;

fn tag_from_row(row: &PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        mention_count: row.get("mention_count"),
    }
}

/// Postgres ARE pattern matching `[[name]]` with optional inner whitespace.
fn mention_pattern(name: &str) -> String {
    format!(r"\[\[\s*{}\s*\]\]", regex::escape(name))
}

/// Replacement text for `regexp_replace`, where `\` is special.
fn mention_replacement(name: &str) -> String {
    format!("[[{}]]", name.replace('\\', r"\\"))
}

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Tag> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tags t WHERE t.id = $1 AND t.user_id = $2",
            TAG_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::not_found("Tag", id))?;

        Ok(tag_from_row(&row))
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tags t WHERE t.user_id = $1 ORDER BY lower(t.name)",
            TAG_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    async fn rename(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Tag> {
        let name = name.trim();
        validate_tag_name(name).map_err(Error::InvalidInput)?;
        let current = self.get(user_id, id).await?;
        if current.name == name {
            return Ok(current);
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("UPDATE tags SET name = $3, updated_at = now() WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, format!("Tag '{}' already exists", name)))?;

        let pattern = mention_pattern(&current.name);
        let replacement = mention_replacement(name);
        let mut rewritten = 0;
        for (table, column) in [
            ("notes", "note_id"),
            ("todos", "todo_id"),
            ("comments", "comment_id"),
        ] {
            rewritten += sqlx::query(&format!(
                r#"
                UPDATE {table} SET content = regexp_replace(content, $2, $3, 'gi'), updated_at = now()
                WHERE id IN (SELECT {column} FROM tag_mentions WHERE tag_id = $1)
                "#
            ))
            .bind(id)
            .bind(&pattern)
            .bind(&replacement)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "tags",
            op = "rename",
            user_id = %user_id,
            tag_id = %id,
            items_rewritten = rewritten,
            "Tag renamed"
        );
        self.get(user_id, id).await
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Tag", id));
        }
        Ok(())
    }

    async fn items(&self, user_id: Uuid, id: Uuid) -> Result<ItemCollection> {
        self.get(user_id, id).await?;

        let notes = sqlx::query(&format!(
            r#"
            SELECT {} FROM notes n
            JOIN tag_mentions tm ON tm.note_id = n.id
            WHERE tm.tag_id = $1 AND n.user_id = $2 AND n.deleted_at IS NULL
            ORDER BY n.updated_at DESC
            "#,
            NOTE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let todos = sqlx::query(&format!(
            r#"
            SELECT {} FROM todos t
            JOIN tag_mentions tm ON tm.todo_id = t.id
            WHERE tm.tag_id = $1 AND t.user_id = $2 AND t.deleted_at IS NULL
            ORDER BY t.date DESC, t.position
            "#,
            TODO_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let comments = sqlx::query(&format!(
            r#"
            SELECT {} FROM comments c
            JOIN tag_mentions tm ON tm.comment_id = c.id
            WHERE tm.tag_id = $1 AND c.user_id = $2
            ORDER BY c.created_at DESC
            "#,
            COMMENT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(ItemCollection {
            notes: notes_from_rows(&notes)?,
            todos: todos_from_rows(&todos)?,
            comments: comments_from_rows(&comments)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_pattern_escapes_regex_metacharacters() {
        let pattern = mention_pattern("c++ (notes)");
        assert!(pattern.contains(r"c\+\+ \(notes\)"));
        let re = regex::RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .unwrap();
        assert!(re.is_match("see [[ C++ (Notes) ]] later"));
        assert!(!re.is_match("see [[c]] later"));
    }

    #[test]
    fn replacement_escapes_backslashes() {
        assert_eq!(mention_replacement(r"a\b"), r"[[a\\b]]");
        assert_eq!(mention_replacement("reading"), "[[reading]]");
    }
}
