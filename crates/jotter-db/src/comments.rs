//! Comment repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use jotter_core::{Comment, CommentRepository, CommentTarget, Error, ItemRef, Result};

use crate::items::{
    comment_from_row, comments_from_rows, ensure_item_owned, require_content, sync_mentions,
    COMMENT_COLUMNS,
};

fn target_item(target: CommentTarget) -> ItemRef {
    match target {
        CommentTarget::Todo(id) => ItemRef::Todo(id),
        CommentTarget::Note(id) => ItemRef::Note(id),
    }
}

/// PostgreSQL implementation of CommentRepository.
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: Pool<Postgres>,
}

impl PgCommentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Comment> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM comments c WHERE c.id = $1 AND c.user_id = $2",
            COMMENT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::not_found("Comment", id))?;

        comment_from_row(&row)
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(
        &self,
        user_id: Uuid,
        target: CommentTarget,
        content: &str,
    ) -> Result<Comment> {
        require_content("Comment", content)?;
        let id = Uuid::now_v7();
        let (todo_id, note_id) = match target {
            CommentTarget::Todo(id) => (Some(id), None),
            CommentTarget::Note(id) => (None, Some(id)),
        };

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        ensure_item_owned(&mut tx, user_id, target_item(target)).await?;

        sqlx::query(
            r#"
            INSERT INTO comments (id, user_id, todo_id, note_id, content)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(todo_id)
        .bind(note_id)
        .bind(content)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sync_mentions(&mut tx, user_id, ItemRef::Comment(id), content).await?;
        tx.commit().await.map_err(Error::Database)?;

        self.get(user_id, id).await
    }

    async fn list_for(&self, user_id: Uuid, target: CommentTarget) -> Result<Vec<Comment>> {
        let column = target_item(target).column();
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM comments c
            WHERE c.user_id = $1 AND c.{} = $2
            ORDER BY c.created_at
            "#,
            COMMENT_COLUMNS, column
        ))
        .bind(user_id)
        .bind(target.id())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        comments_from_rows(&rows)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, content: &str) -> Result<Comment> {
        require_content("Comment", content)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = sqlx::query(
            "UPDATE comments SET content = $3, updated_at = now() WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(content)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Comment", id));
        }

        sync_mentions(&mut tx, user_id, ItemRef::Comment(id), content).await?;
        tx.commit().await.map_err(Error::Database)?;

        self.get(user_id, id).await
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Comment", id));
        }
        Ok(())
    }
}
