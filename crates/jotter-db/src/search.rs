//! Trigram search over a user's live notes and todos.
//!
//! Matches use `pg_trgm` similarity (`%`, threshold 0.3 by default) plus a
//! plain substring fallback, so short queries that trigram matching misses
//! still find exact fragments.

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use jotter_core::{Error, Result, SearchHit, SearchHitKind};

use crate::escape_like;

/// Default number of hits.
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Upper bound on requested hits.
pub const MAX_SEARCH_LIMIT: i64 = 100;

/// Search provider using PostgreSQL trigram indexes.
#[derive(Clone)]
pub struct PgSearch {
    pool: Pool<Postgres>,
}

impl PgSearch {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Search notes (title and content) and todos (content).
    ///
    /// `limit` is clamped to `1..=MAX_SEARCH_LIMIT`. Results are ordered by
    /// score, best first.
    pub async fn search(&self, user_id: Uuid, query: &str, limit: i64) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("Search query cannot be empty".into()));
        }
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        let escaped_query = escape_like(query);

        // $1 = user, $2 = raw query (similarity), $3 = escaped query (ILIKE), $4 = limit
        let rows = sqlx::query(
            r#"
            SELECT * FROM (
                SELECT 'note' AS kind,
                       n.id,
                       n.title,
                       left(n.content, 200) AS snippet,
                       n.date,
                       n.folder_id,
                       GREATEST(
                           similarity(n.content, $2),
                           similarity(COALESCE(n.title, ''), $2)
                       ) AS score
                FROM notes n
                WHERE n.user_id = $1 AND n.deleted_at IS NULL
                  AND (
                      n.content % $2
                      OR COALESCE(n.title, '') % $2
                      OR n.content ILIKE '%' || $3 || '%' ESCAPE '\'
                      OR n.title ILIKE '%' || $3 || '%' ESCAPE '\'
                  )
                UNION ALL
                SELECT 'todo' AS kind,
                       t.id,
                       NULL::text AS title,
                       left(t.content, 200) AS snippet,
                       t.date,
                       NULL::uuid AS folder_id,
                       similarity(t.content, $2) AS score
                FROM todos t
                WHERE t.user_id = $1 AND t.deleted_at IS NULL
                  AND (
                      t.content % $2
                      OR t.content ILIKE '%' || $3 || '%' ESCAPE '\'
                  )
            ) hits
            ORDER BY score DESC, id
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(query)
        .bind(&escaped_query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter()
            .map(|row| {
                let kind: String = row.get("kind");
                let kind = match kind.as_str() {
                    "note" => SearchHitKind::Note,
                    _ => SearchHitKind::Todo,
                };
                Ok(SearchHit {
                    kind,
                    id: row.get("id"),
                    title: row.get("title"),
                    snippet: row.get("snippet"),
                    date: row.get("date"),
                    folder_id: row.get("folder_id"),
                    score: row.get("score"),
                })
            })
            .collect()
    }
}
