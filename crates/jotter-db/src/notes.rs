//! Note repository implementation.
//!
//! Daily notes are keyed by date. Generic notes live in the folder tree and
//! carry a slug that is unique among the live notes of their folder.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use jotter_core::{
    slugify, unique_slug, CreateNoteRequest, Error, ItemRef, Note, NoteKind, NoteRepository,
    Result, UpdateNoteRequest,
};

use crate::folders::ensure_folder_owned;
use crate::items::{conflict_on_unique, note_from_row, notes_from_rows, sync_mentions, NOTE_COLUMNS};

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

/// Slugs of live generic notes in a folder, optionally ignoring one note.
async fn taken_slugs(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    folder_id: Option<Uuid>,
    except: Option<Uuid>,
) -> Result<HashSet<String>> {
    let slugs: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT slug FROM notes
        WHERE user_id = $1
          AND folder_id IS NOT DISTINCT FROM $2
          AND kind = 'generic'
          AND deleted_at IS NULL
          AND id IS DISTINCT FROM $3
        "#,
    )
    .bind(user_id)
    .bind(folder_id)
    .bind(except)
    .fetch_all(&mut **tx)
    .await
    .map_err(Error::Database)?;

    Ok(slugs.into_iter().collect())
}

fn clean_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("Note title cannot be empty".into()));
    }
    Ok(title)
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch(&self, user_id: Uuid, id: Uuid, include_deleted: bool) -> Result<Note> {
        let live = if include_deleted {
            ""
        } else {
            " AND n.deleted_at IS NULL"
        };
        let row = sqlx::query(&format!(
            "SELECT {} FROM notes n WHERE n.id = $1 AND n.user_id = $2{}",
            NOTE_COLUMNS, live
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::not_found("Note", id))?;

        note_from_row(&row)
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn create(&self, user_id: Uuid, req: CreateNoteRequest) -> Result<Note> {
        req.validate()?;

        let id = Uuid::now_v7();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let (title, slug, position) = match req.kind {
            NoteKind::Daily => {
                let position: i32 = sqlx::query_scalar(
                    r#"
                    SELECT COALESCE(MAX(position) + 1, 0) FROM notes
                    WHERE user_id = $1 AND date = $2 AND deleted_at IS NULL
                    "#,
                )
                .bind(user_id)
                .bind(req.date)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;
                let title = req
                    .title
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string);
                (title, None, position)
            }
            NoteKind::Generic => {
                if let Some(folder_id) = req.folder_id {
                    ensure_folder_owned(&mut tx, user_id, folder_id).await?;
                }
                let title = clean_title(req.title.as_deref().unwrap_or_default())?.to_string();
                let taken = taken_slugs(&mut tx, user_id, req.folder_id, None).await?;
                let slug = unique_slug(&slugify(&title), &taken);
                (Some(title), Some(slug), 0)
            }
        };

        sqlx::query(
            r#"
            INSERT INTO notes (id, user_id, kind, date, folder_id, title, slug, content, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(req.kind.as_str())
        .bind(req.date)
        .bind(req.folder_id)
        .bind(&title)
        .bind(&slug)
        .bind(&req.content)
        .bind(position)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "A note with this title already exists here"))?;

        sync_mentions(&mut tx, user_id, ItemRef::Note(id), &req.content).await?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(subsystem = "db", component = "notes", op = "create", user_id = %user_id, note_id = %id, kind = req.kind.as_str(), "Note created");
        self.get(user_id, id).await
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Note> {
        self.fetch(user_id, id, false).await
    }

    async fn get_by_slug(
        &self,
        user_id: Uuid,
        folder_id: Option<Uuid>,
        slug: &str,
    ) -> Result<Note> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM notes n
            WHERE n.user_id = $1 AND n.folder_id IS NOT DISTINCT FROM $2 AND n.slug = $3
              AND n.kind = 'generic' AND n.deleted_at IS NULL
            "#,
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .bind(folder_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::not_found("Note", slug))?;

        note_from_row(&row)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        let current = self.get(user_id, id).await?;
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let (title, slug) = match (&req.title, current.kind) {
            (None, _) => (current.title.clone(), current.slug.clone()),
            (Some(title), NoteKind::Generic) => {
                let title = clean_title(title)?.to_string();
                let taken = taken_slugs(&mut tx, user_id, current.folder_id, Some(id)).await?;
                let slug = unique_slug(&slugify(&title), &taken);
                (Some(title), Some(slug))
            }
            (Some(title), NoteKind::Daily) => {
                let title = title.trim();
                let title = (!title.is_empty()).then(|| title.to_string());
                (title, None)
            }
        };

        sqlx::query(
            r#"
            UPDATE notes SET
                title = $3,
                slug = $4,
                content = COALESCE($5, content),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&title)
        .bind(&slug)
        .bind(req.content.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "A note with this title already exists here"))?;

        if let Some(content) = &req.content {
            sync_mentions(&mut tx, user_id, ItemRef::Note(id), content).await?;
        }
        tx.commit().await.map_err(Error::Database)?;

        self.get(user_id, id).await
    }

    async fn move_to_folder(
        &self,
        user_id: Uuid,
        id: Uuid,
        folder_id: Option<Uuid>,
    ) -> Result<Note> {
        let current = self.get(user_id, id).await?;
        if current.kind != NoteKind::Generic {
            return Err(Error::InvalidInput(
                "Only generic notes can be moved between folders".into(),
            ));
        }
        if current.folder_id == folder_id {
            return Ok(current);
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        if let Some(folder_id) = folder_id {
            ensure_folder_owned(&mut tx, user_id, folder_id).await?;
        }

        let taken = taken_slugs(&mut tx, user_id, folder_id, Some(id)).await?;
        let base = current
            .slug
            .clone()
            .unwrap_or_else(|| slugify(current.title.as_deref().unwrap_or_default()));
        let slug = unique_slug(&base, &taken);

        sqlx::query(
            r#"
            UPDATE notes SET folder_id = $3, slug = $4, updated_at = now()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(folder_id)
        .bind(&slug)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "A note with this title already exists here"))?;
        tx.commit().await.map_err(Error::Database)?;

        self.get(user_id, id).await
    }

    async fn soft_delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE notes SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Note", id));
        }
        Ok(())
    }

    async fn restore(&self, user_id: Uuid, id: Uuid) -> Result<Note> {
        let deleted = self.fetch(user_id, id, true).await?;
        if deleted.deleted_at.is_none() {
            return Ok(deleted);
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // A live note may have taken the slug while this one was in the trash.
        let slug = match (&deleted.kind, &deleted.slug) {
            (NoteKind::Generic, Some(slug)) => {
                let taken = taken_slugs(&mut tx, user_id, deleted.folder_id, Some(id)).await?;
                Some(unique_slug(slug, &taken))
            }
            _ => deleted.slug.clone(),
        };

        sqlx::query(
            r#"
            UPDATE notes SET deleted_at = NULL, slug = $3, updated_at = now()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&slug)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "A note with this title already exists here"))?;
        tx.commit().await.map_err(Error::Database)?;

        self.get(user_id, id).await
    }

    async fn list_for_date(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<Note>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM notes n
            WHERE n.user_id = $1 AND n.kind = 'daily' AND n.date = $2 AND n.deleted_at IS NULL
            ORDER BY n.position, n.created_at
            "#,
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        notes_from_rows(&rows)
    }

    async fn list_in_folder(&self, user_id: Uuid, folder_id: Option<Uuid>) -> Result<Vec<Note>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM notes n
            WHERE n.user_id = $1 AND n.kind = 'generic'
              AND n.folder_id IS NOT DISTINCT FROM $2 AND n.deleted_at IS NULL
            ORDER BY lower(n.title), n.created_at
            "#,
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        notes_from_rows(&rows)
    }

    async fn list_trash(&self, user_id: Uuid) -> Result<Vec<Note>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM notes n
            WHERE n.user_id = $1 AND n.deleted_at IS NOT NULL
            ORDER BY n.deleted_at DESC
            "#,
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        notes_from_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_title_trims_and_rejects_blank() {
        assert_eq!(clean_title("  Plans  ").unwrap(), "Plans");
        assert!(matches!(clean_title("   "), Err(Error::InvalidInput(_))));
    }
}
