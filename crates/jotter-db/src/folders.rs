//! Folder tree for generic notes.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use jotter_core::{
    slugify, unique_slug, CreateFolderRequest, Error, FolderRepository, NoteFolder, Result,
};

use crate::items::conflict_on_unique;

const FOLDER_COLUMNS: &str = r#"
    f.id, f.user_id, f.parent_id, f.name, f.slug, f.position, f.created_at, f.updated_at,
    (SELECT COUNT(*) FROM notes n WHERE n.folder_id = f.id AND n.deleted_at IS NULL) AS note_count
"#;

fn folder_from_row(row: &PgRow, depth: i32) -> NoteFolder {
    NoteFolder {
        id: row.get("id"),
        user_id: row.get("user_id"),
        parent_id: row.get("parent_id"),
        name: row.get("name"),
        slug: row.get("slug"),
        position: row.get("position"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        depth,
        note_count: row.get("note_count"),
    }
}

fn clean_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Folder name cannot be empty".into()));
    }
    Ok(name)
}

/// Fail with NotFound unless the folder exists and belongs to the user.
pub(crate) async fn ensure_folder_owned(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    folder_id: Uuid,
) -> Result<()> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM note_folders WHERE id = $1 AND user_id = $2)",
    )
    .bind(folder_id)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(Error::Database)?;

    if !exists {
        return Err(Error::not_found("Folder", folder_id));
    }
    Ok(())
}

/// Ids of a folder and all of its descendants.
async fn subtree_ids(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    root: Uuid,
) -> Result<Vec<Uuid>> {
    sqlx::query_scalar(
        r#"
        WITH RECURSIVE subtree AS (
            SELECT id, ARRAY[id] AS path FROM note_folders WHERE id = $1 AND user_id = $2
            UNION ALL
            SELECT c.id, s.path || c.id
            FROM note_folders c JOIN subtree s ON c.parent_id = s.id
            WHERE NOT c.id = ANY(s.path)
        )
        SELECT id FROM subtree
        "#,
    )
    .bind(root)
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(Error::Database)
}

async fn sibling_slugs(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    parent_id: Option<Uuid>,
    except: Option<Uuid>,
) -> Result<HashSet<String>> {
    let slugs: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT slug FROM note_folders
        WHERE user_id = $1 AND parent_id IS NOT DISTINCT FROM $2 AND id IS DISTINCT FROM $3
        "#,
    )
    .bind(user_id)
    .bind(parent_id)
    .bind(except)
    .fetch_all(&mut **tx)
    .await
    .map_err(Error::Database)?;

    Ok(slugs.into_iter().collect())
}

async fn next_sibling_position(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    parent_id: Option<Uuid>,
) -> Result<i32> {
    sqlx::query_scalar(
        r#"
        SELECT COALESCE(MAX(position) + 1, 0) FROM note_folders
        WHERE user_id = $1 AND parent_id IS NOT DISTINCT FROM $2
        "#,
    )
    .bind(user_id)
    .bind(parent_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(Error::Database)
}

/// PostgreSQL implementation of FolderRepository.
#[derive(Clone)]
pub struct PgFolderRepository {
    pool: Pool<Postgres>,
}

impl PgFolderRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderRepository for PgFolderRepository {
    async fn create(&self, user_id: Uuid, req: CreateFolderRequest) -> Result<NoteFolder> {
        let name = clean_name(&req.name)?;
        let id = Uuid::now_v7();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        if let Some(parent_id) = req.parent_id {
            ensure_folder_owned(&mut tx, user_id, parent_id).await?;
        }
        let taken = sibling_slugs(&mut tx, user_id, req.parent_id, None).await?;
        let slug = unique_slug(&slugify(name), &taken);
        let position = next_sibling_position(&mut tx, user_id, req.parent_id).await?;

        sqlx::query(
            r#"
            INSERT INTO note_folders (id, user_id, parent_id, name, slug, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(req.parent_id)
        .bind(name)
        .bind(&slug)
        .bind(position)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "A folder with this name already exists here"))?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(subsystem = "db", component = "folders", op = "create", user_id = %user_id, folder_id = %id, "Folder created");
        self.get(user_id, id).await
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<NoteFolder> {
        let row = sqlx::query(&format!(
            r#"
            WITH RECURSIVE ancestors AS (
                SELECT id, parent_id, 0 AS depth FROM note_folders WHERE id = $1 AND user_id = $2
                UNION ALL
                SELECT p.id, p.parent_id, a.depth + 1
                FROM note_folders p JOIN ancestors a ON p.id = a.parent_id
                WHERE a.depth < 1000
            )
            SELECT {}, (SELECT MAX(depth) FROM ancestors) AS depth
            FROM note_folders f WHERE f.id = $1 AND f.user_id = $2
            "#,
            FOLDER_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::not_found("Folder", id))?;

        let depth: i32 = row.get("depth");
        Ok(folder_from_row(&row, depth))
    }

    async fn rename(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<NoteFolder> {
        let name = clean_name(name)?;
        let current = self.get(user_id, id).await?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let taken = sibling_slugs(&mut tx, user_id, current.parent_id, Some(id)).await?;
        let slug = unique_slug(&slugify(name), &taken);

        sqlx::query(
            "UPDATE note_folders SET name = $3, slug = $4, updated_at = now() WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(&slug)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "A folder with this name already exists here"))?;
        tx.commit().await.map_err(Error::Database)?;

        self.get(user_id, id).await
    }

    async fn move_to(
        &self,
        user_id: Uuid,
        id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<NoteFolder> {
        let current = self.get(user_id, id).await?;
        if current.parent_id == parent_id {
            return Ok(current);
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        if let Some(parent_id) = parent_id {
            ensure_folder_owned(&mut tx, user_id, parent_id).await?;
            if subtree_ids(&mut tx, user_id, id).await?.contains(&parent_id) {
                return Err(Error::InvalidInput(
                    "A folder cannot be moved into itself or one of its subfolders".into(),
                ));
            }
        }

        let taken = sibling_slugs(&mut tx, user_id, parent_id, Some(id)).await?;
        let slug = unique_slug(&current.slug, &taken);
        let position = next_sibling_position(&mut tx, user_id, parent_id).await?;

        sqlx::query(
            r#"
            UPDATE note_folders SET parent_id = $3, slug = $4, position = $5, updated_at = now()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(parent_id)
        .bind(&slug)
        .bind(position)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "A folder with this name already exists here"))?;
        tx.commit().await.map_err(Error::Database)?;

        self.get(user_id, id).await
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let ids = subtree_ids(&mut tx, user_id, id).await?;
        if ids.is_empty() {
            return Err(Error::not_found("Folder", id));
        }

        // Notes go to the trash at the root; restoring them re-slugs as needed.
        let trashed = sqlx::query(
            r#"
            UPDATE notes SET deleted_at = now(), folder_id = NULL, updated_at = now()
            WHERE user_id = $1 AND folder_id = ANY($2) AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(&ids)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        sqlx::query("DELETE FROM note_folders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "folders",
            op = "delete",
            user_id = %user_id,
            folder_id = %id,
            folder_count = ids.len(),
            notes_trashed = trashed,
            "Folder subtree deleted"
        );
        Ok(())
    }

    async fn list_tree(&self, user_id: Uuid) -> Result<Vec<NoteFolder>> {
        let rows = sqlx::query(&format!(
            r#"
            WITH RECURSIVE tree AS (
                SELECT id, 0 AS depth,
                       ARRAY[lpad(position::text, 10, '0') || '/' || slug] AS sort_path,
                       ARRAY[id] AS path
                FROM note_folders
                WHERE user_id = $1 AND parent_id IS NULL
                UNION ALL
                SELECT c.id, t.depth + 1,
                       t.sort_path || (lpad(c.position::text, 10, '0') || '/' || c.slug),
                       t.path || c.id
                FROM note_folders c JOIN tree t ON c.parent_id = t.id
                WHERE NOT c.id = ANY(t.path)
            )
            SELECT {}, tree.depth
            FROM tree JOIN note_folders f ON f.id = tree.id
            ORDER BY tree.sort_path
            "#,
            FOLDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| folder_from_row(row, row.get("depth")))
            .collect())
    }
}
