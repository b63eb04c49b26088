//! PostgreSQL note storage.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use keepmark_core::{ContentKind, Error, ListQuery, Note, NoteInput, NoteRepository, Result};

use crate::list_filter::{bind_query_params, ListFilterQueryBuilder, TEXT_SEARCH_CONFIG};

const NOTE_COLUMNS: &str =
    "id, title, content, tags, is_favorite, owner_id, created_at, updated_at";

/// Notes table access. `search_tsv` is rebuilt from title, content and tags
/// on every write.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn not_found() -> Error {
        Error::NotFound(ContentKind::Note.not_found_message())
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, owner_id: Option<Uuid>, input: NoteInput) -> Result<Note> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO notes (id, title, content, tags, is_favorite, owner_id, created_at, updated_at, search_tsv)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7,
                     to_tsvector('{cfg}', $2 || ' ' || $3 || ' ' || array_to_string($4::text[], ' ')))
             RETURNING {cols}",
            cfg = TEXT_SEARCH_CONFIG,
            cols = NOTE_COLUMNS
        );

        let note = sqlx::query_as::<_, Note>(&sql)
            .bind(Uuid::now_v7())
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.tags)
            .bind(input.is_favorite)
            .bind(owner_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(note)
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        let sql = format!("SELECT {} FROM notes WHERE id = $1", NOTE_COLUMNS);
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(Self::not_found)
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<Note>> {
        let (where_clause, params) = ListFilterQueryBuilder::new(&query, 0).build();
        let sql = format!(
            "SELECT {} FROM notes WHERE {} ORDER BY created_at DESC",
            NOTE_COLUMNS, where_clause
        );
        debug!(
            subsystem = "db",
            component = "notes",
            op = "list",
            param_count = params.len(),
            "Listing notes"
        );

        let q = bind_query_params!(sqlx::query_as::<_, Note>(&sql), &params);
        q.fetch_all(&self.pool).await.map_err(Error::Database)
    }

    async fn update(&self, id: Uuid, input: NoteInput) -> Result<Note> {
        let sql = format!(
            "UPDATE notes
             SET title = $2, content = $3, tags = $4, is_favorite = $5, updated_at = $6,
                 search_tsv = to_tsvector('{cfg}', $2 || ' ' || $3 || ' ' || array_to_string($4::text[], ' '))
             WHERE id = $1
             RETURNING {cols}",
            cfg = TEXT_SEARCH_CONFIG,
            cols = NOTE_COLUMNS
        );

        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.tags)
            .bind(input.is_favorite)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(Self::not_found)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Self::not_found());
        }
        Ok(())
    }
}
