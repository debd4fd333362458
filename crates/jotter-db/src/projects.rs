//! Project repository implementation.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use jotter_core::{
    CreateProjectRequest, Error, ItemCollection, ItemRef, Project, ProjectRepository, Result,
    UpdateProjectRequest,
};

use crate::items::{
    comments_from_rows, conflict_on_unique, ensure_item_owned, notes_from_rows, todos_from_rows,
    COMMENT_COLUMNS, NOTE_COLUMNS, TODO_COLUMNS,
};

/// Maximum length of a project color string (`#rrggbb`, `oklch(...)`, ...).
const MAX_COLOR_LEN: usize = 64;

const PROJECT_COLUMNS: &str = r#"
    p.id, p.user_id, p.name, p.color, p.emoji, p.archived, p.created_at,
    (SELECT COUNT(*) FROM project_assignments pa WHERE pa.project_id = p.id) AS item_count
"#;

fn project_from_row(row: &PgRow) -> Project {
    Project {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        color: row.get("color"),
        emoji: row.get("emoji"),
        archived: row.get("archived"),
        created_at: row.get("created_at"),
        item_count: row.get("item_count"),
    }
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Project name cannot be empty".into()));
    }
    Ok(name)
}

fn validate_color(color: &str) -> Result<&str> {
    let color = color.trim();
    if color.is_empty() || color.len() > MAX_COLOR_LEN {
        return Err(Error::InvalidInput(format!(
            "Project color must be 1-{} characters",
            MAX_COLOR_LEN
        )));
    }
    Ok(color)
}

/// PostgreSQL implementation of ProjectRepository.
#[derive(Clone)]
pub struct PgProjectRepository {
    pool: Pool<Postgres>,
}

impl PgProjectRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn ensure_owned(&self, user_id: Uuid, project_id: Uuid) -> Result<()> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        if !exists {
            return Err(Error::not_found("Project", project_id));
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn create(&self, user_id: Uuid, req: CreateProjectRequest) -> Result<Project> {
        let name = validate_name(&req.name)?;
        let color = validate_color(&req.color)?;
        let emoji = req.emoji.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let id = Uuid::now_v7();

        sqlx::query(
            "INSERT INTO projects (id, user_id, name, color, emoji) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(color)
        .bind(emoji)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Project '{}' already exists", name)))?;

        debug!(subsystem = "db", component = "projects", op = "create", user_id = %user_id, project_id = %id, "Project created");
        self.get(user_id, id).await
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Project> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM projects p WHERE p.id = $1 AND p.user_id = $2",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::not_found("Project", id))?;

        Ok(project_from_row(&row))
    }

    async fn list(&self, user_id: Uuid, include_archived: bool) -> Result<Vec<Project>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM projects p
            WHERE p.user_id = $1 AND ($2 OR NOT p.archived)
            ORDER BY p.archived, lower(p.name)
            "#,
            PROJECT_COLUMNS
        ))
        .bind(user_id)
        .bind(include_archived)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(project_from_row).collect())
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        req: UpdateProjectRequest,
    ) -> Result<Project> {
        let current = self.get(user_id, id).await?;

        let name = match &req.name {
            Some(name) => validate_name(name)?.to_string(),
            None => current.name,
        };
        let color = match &req.color {
            Some(color) => validate_color(color)?.to_string(),
            None => current.color,
        };
        let emoji = match &req.emoji {
            Some(emoji) => Some(emoji.trim()).filter(|e| !e.is_empty()).map(str::to_string),
            None => current.emoji,
        };
        let archived = req.archived.unwrap_or(current.archived);

        sqlx::query(
            r#"
            UPDATE projects SET name = $3, color = $4, emoji = $5, archived = $6, updated_at = now()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&name)
        .bind(&color)
        .bind(&emoji)
        .bind(archived)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Project '{}' already exists", name)))?;

        self.get(user_id, id).await
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Project", id));
        }
        Ok(())
    }

    async fn assign(&self, user_id: Uuid, project_id: Uuid, item: ItemRef) -> Result<()> {
        self.ensure_owned(user_id, project_id).await?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        ensure_item_owned(&mut tx, user_id, item).await?;

        let inserted = sqlx::query(&format!(
            "INSERT INTO project_assignments (id, project_id, {}) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
            item.column()
        ))
        .bind(Uuid::now_v7())
        .bind(project_id)
        .bind(item.id())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        // Assignments have no trigger of their own; touching the item
        // publishes the change on its channel.
        if inserted > 0 {
            sqlx::query(&format!(
                "UPDATE {} SET updated_at = now() WHERE id = $1",
                item.table()
            ))
            .bind(item.id())
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn unassign(&self, user_id: Uuid, project_id: Uuid, item: ItemRef) -> Result<()> {
        self.ensure_owned(user_id, project_id).await?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let removed = sqlx::query(&format!(
            "DELETE FROM project_assignments WHERE project_id = $1 AND {} = $2",
            item.column()
        ))
        .bind(project_id)
        .bind(item.id())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if removed > 0 {
            sqlx::query(&format!(
                "UPDATE {} SET updated_at = now() WHERE id = $1 AND user_id = $2",
                item.table()
            ))
            .bind(item.id())
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn items(&self, user_id: Uuid, project_id: Uuid) -> Result<ItemCollection> {
        self.ensure_owned(user_id, project_id).await?;

        let notes = sqlx::query(&format!(
            r#"
            SELECT {} FROM notes n
            JOIN project_assignments pa ON pa.note_id = n.id
            WHERE pa.project_id = $1 AND n.user_id = $2 AND n.deleted_at IS NULL
            ORDER BY n.updated_at DESC
            "#,
            NOTE_COLUMNS
        ))
        .bind(project_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let todos = sqlx::query(&format!(
            r#"
            SELECT {} FROM todos t
            JOIN project_assignments pa ON pa.todo_id = t.id
            WHERE pa.project_id = $1 AND t.user_id = $2 AND t.deleted_at IS NULL
            ORDER BY t.date DESC, t.position
            "#,
            TODO_COLUMNS
        ))
        .bind(project_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let comments = sqlx::query(&format!(
            r#"
            SELECT {} FROM comments c
            JOIN project_assignments pa ON pa.comment_id = c.id
            WHERE pa.project_id = $1 AND c.user_id = $2
            ORDER BY c.created_at DESC
            "#,
            COMMENT_COLUMNS
        ))
        .bind(project_id)
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
    fn color_must_be_present_and_bounded() {
        assert_eq!(validate_color(" #ff8800 ").unwrap(), "#ff8800");
        assert!(validate_color("").is_err());
        assert!(validate_color(&"x".repeat(MAX_COLOR_LEN + 1)).is_err());
    }

    #[test]
    fn name_is_trimmed() {
        assert_eq!(validate_name("  Garden ").unwrap(), "Garden");
        assert!(validate_name(" ").is_err());
    }
}
