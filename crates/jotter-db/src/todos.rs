//! Todo repository implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use jotter_core::{
    CreateTodoRequest, Error, ItemRef, Result, Todo, TodoRepository, UpdateTodoRequest,
};

use crate::items::{require_content, sync_mentions, todo_from_row, todos_from_rows, TODO_COLUMNS};

/// PostgreSQL implementation of TodoRepository.
#[derive(Clone)]
pub struct PgTodoRepository {
    pool: Pool<Postgres>,
}

impl PgTodoRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Next free position at the end of a day.
    async fn next_position(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<i32> {
        sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(position) + 1, 0) FROM todos
            WHERE user_id = $1 AND date = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)
    }

    async fn fetch(&self, user_id: Uuid, id: Uuid, include_deleted: bool) -> Result<Todo> {
        let live = if include_deleted {
            ""
        } else {
            " AND t.deleted_at IS NULL"
        };
        let row = sqlx::query(&format!(
            "SELECT {} FROM todos t WHERE t.id = $1 AND t.user_id = $2{}",
            TODO_COLUMNS, live
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::not_found("Todo", id))?;

        todo_from_row(&row)
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    async fn create(&self, user_id: Uuid, req: CreateTodoRequest) -> Result<Todo> {
        require_content("Todo", &req.content)?;

        let id = Uuid::now_v7();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let position = Self::next_position(&mut tx, user_id, req.date).await?;
        sqlx::query(
            r#"
            INSERT INTO todos (id, user_id, date, content, priority, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(req.date)
        .bind(&req.content)
        .bind(req.priority.as_str())
        .bind(position)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sync_mentions(&mut tx, user_id, ItemRef::Todo(id), &req.content).await?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(subsystem = "db", component = "todos", op = "create", user_id = %user_id, todo_id = %id, "Todo created");
        self.get(user_id, id).await
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Todo> {
        self.fetch(user_id, id, false).await
    }

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateTodoRequest) -> Result<Todo> {
        if let Some(content) = &req.content {
            require_content("Todo", content)?;
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(
            r#"
            SELECT date, position FROM todos
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::not_found("Todo", id))?;

        let current_date: NaiveDate = row.get("date");
        let mut position: i32 = row.get("position");
        let date = req.date.unwrap_or(current_date);
        if date != current_date {
            position = Self::next_position(&mut tx, user_id, date).await?;
        }

        sqlx::query(
            r#"
            UPDATE todos SET
                content = COALESCE($3, content),
                priority = COALESCE($4, priority),
                date = $5,
                position = $6,
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(req.content.as_deref())
        .bind(req.priority.map(|p| p.as_str()))
        .bind(date)
        .bind(position)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if let Some(content) = &req.content {
            sync_mentions(&mut tx, user_id, ItemRef::Todo(id), content).await?;
        }
        tx.commit().await.map_err(Error::Database)?;

        self.get(user_id, id).await
    }

    async fn set_completed(&self, user_id: Uuid, id: Uuid, completed: bool) -> Result<Todo> {
        let result = sqlx::query(
            r#"
            UPDATE todos SET
                completed = $3,
                completed_at = CASE WHEN $3 THEN COALESCE(completed_at, now()) ELSE NULL END,
                updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(completed)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Todo", id));
        }
        self.get(user_id, id).await
    }

    async fn toggle(&self, user_id: Uuid, id: Uuid) -> Result<Todo> {
        let result = sqlx::query(
            r#"
            UPDATE todos SET
                completed = NOT completed,
                completed_at = CASE WHEN completed THEN NULL ELSE now() END,
                updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Todo", id));
        }
        self.get(user_id, id).await
    }

    async fn soft_delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE todos SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Todo", id));
        }
        Ok(())
    }

    async fn restore(&self, user_id: Uuid, id: Uuid) -> Result<Todo> {
        let deleted = self.fetch(user_id, id, true).await?;
        if deleted.deleted_at.is_none() {
            return Ok(deleted);
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let position = Self::next_position(&mut tx, user_id, deleted.date).await?;
        sqlx::query(
            r#"
            UPDATE todos SET deleted_at = NULL, position = $3, updated_at = now()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(position)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;
        tx.commit().await.map_err(Error::Database)?;

        self.get(user_id, id).await
    }

    async fn reorder(&self, user_id: Uuid, date: NaiveDate, ordered_ids: &[Uuid]) -> Result<()> {
        let mut seen = HashSet::with_capacity(ordered_ids.len());
        if let Some(dup) = ordered_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(Error::InvalidInput(format!("Todo {} listed twice", dup)));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let on_day: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM todos
            WHERE user_id = $1 AND date = $2 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&mut *tx)
        .await
        .map_err(Error::Database)?;
        let on_day: HashSet<Uuid> = on_day.into_iter().collect();

        if let Some(stray) = ordered_ids.iter().find(|id| !on_day.contains(id)) {
            return Err(Error::InvalidInput(format!(
                "Todo {} is not on {}",
                stray, date
            )));
        }

        // Listed todos take positions 0..n; the rest follow in their old order.
        sqlx::query(
            r#"
            UPDATE todos t SET position = (o.ord - 1)::int, updated_at = now()
            FROM unnest($1::uuid[]) WITH ORDINALITY AS o(id, ord)
            WHERE t.id = o.id AND t.user_id = $2 AND t.position <> (o.ord - 1)::int
            "#,
        )
        .bind(ordered_ids)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query(
            r#"
            WITH rest AS (
                SELECT id, row_number() OVER (ORDER BY position, created_at) AS rn
                FROM todos
                WHERE user_id = $1 AND date = $2 AND deleted_at IS NULL
                  AND NOT (id = ANY($3))
            )
            UPDATE todos t SET position = ($4 + rest.rn - 1)::int, updated_at = now()
            FROM rest
            WHERE t.id = rest.id AND t.position <> ($4 + rest.rn - 1)::int
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(ordered_ids)
        .bind(ordered_ids.len() as i32)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn copy_to_date(&self, user_id: Uuid, id: Uuid, date: NaiveDate) -> Result<Todo> {
        let source = self.get(user_id, id).await?;
        let new_id = Uuid::now_v7();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let position = Self::next_position(&mut tx, user_id, date).await?;
        sqlx::query(
            r#"
            INSERT INTO todos (id, user_id, date, content, priority, position, copied_from_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(new_id)
        .bind(user_id)
        .bind(date)
        .bind(&source.content)
        .bind(source.priority.as_str())
        .bind(position)
        .bind(source.id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sync_mentions(&mut tx, user_id, ItemRef::Todo(new_id), &source.content).await?;
        tx.commit().await.map_err(Error::Database)?;

        self.get(user_id, new_id).await
    }

    async fn list_for_date(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<Todo>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM todos t
            WHERE t.user_id = $1 AND t.date = $2 AND t.deleted_at IS NULL
            ORDER BY t.position, t.created_at
            "#,
            TODO_COLUMNS
        ))
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        todos_from_rows(&rows)
    }

    async fn list_unfinished_before(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<Todo>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM todos t
            WHERE t.user_id = $1 AND t.date < $2
              AND t.completed = false AND t.deleted_at IS NULL
            ORDER BY t.date DESC, t.position
            "#,
            TODO_COLUMNS
        ))
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        todos_from_rows(&rows)
    }
}
