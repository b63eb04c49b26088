//! PostgreSQL bookmark storage.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use keepmark_core::{
    Bookmark, BookmarkInput, BookmarkRepository, ContentKind, Error, ListQuery, Result,
};

use crate::list_filter::{bind_query_params, ListFilterQueryBuilder, TEXT_SEARCH_CONFIG};

const BOOKMARK_COLUMNS: &str =
    "id, url, title, description, tags, is_favorite, owner_id, created_at, updated_at";

/// PostgreSQL implementation of BookmarkRepository.
///
/// The URL itself is not part of the text index; search covers title,
/// description and tags.
#[derive(Clone)]
pub struct PgBookmarkRepository {
    pool: Pool<Postgres>,
}

impl PgBookmarkRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn not_found() -> Error {
        Error::NotFound(ContentKind::Bookmark.not_found_message())
    }
}

#[async_trait]
impl BookmarkRepository for PgBookmarkRepository {
    async fn insert(&self, owner_id: Option<Uuid>, input: BookmarkInput) -> Result<Bookmark> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO bookmarks (id, url, title, description, tags, is_favorite, owner_id, created_at, updated_at, search_tsv)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8,
                     to_tsvector('{cfg}', $3 || ' ' || $4 || ' ' || array_to_string($5::text[], ' ')))
             RETURNING {cols}",
            cfg = TEXT_SEARCH_CONFIG,
            cols = BOOKMARK_COLUMNS
        );

        let bookmark = sqlx::query_as::<_, Bookmark>(&sql)
            .bind(Uuid::now_v7())
            .bind(&input.url)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.tags)
            .bind(input.is_favorite)
            .bind(owner_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(bookmark)
    }

    async fn fetch(&self, id: Uuid) -> Result<Bookmark> {
        let sql = format!("SELECT {} FROM bookmarks WHERE id = $1", BOOKMARK_COLUMNS);
        sqlx::query_as::<_, Bookmark>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(Self::not_found)
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<Bookmark>> {
        let (where_clause, params) = ListFilterQueryBuilder::new(&query, 0).build();
        let sql = format!(
            "SELECT {} FROM bookmarks WHERE {} ORDER BY created_at DESC",
            BOOKMARK_COLUMNS, where_clause
        );
        debug!(
            subsystem = "db",
            component = "bookmarks",
            op = "list",
            param_count = params.len(),
            "Listing bookmarks"
        );

        let q = bind_query_params!(sqlx::query_as::<_, Bookmark>(&sql), &params);
        q.fetch_all(&self.pool).await.map_err(Error::Database)
    }

    async fn update(&self, id: Uuid, input: BookmarkInput) -> Result<Bookmark> {
        let sql = format!(
            "UPDATE bookmarks
             SET url = $2, title = $3, description = $4, tags = $5, is_favorite = $6, updated_at = $7,
                 search_tsv = to_tsvector('{cfg}', $3 || ' ' || $4 || ' ' || array_to_string($5::text[], ' '))
             WHERE id = $1
             RETURNING {cols}",
            cfg = TEXT_SEARCH_CONFIG,
            cols = BOOKMARK_COLUMNS
        );

        sqlx::query_as::<_, Bookmark>(&sql)
            .bind(id)
            .bind(&input.url)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.tags)
            .bind(input.is_favorite)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(Self::not_found)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = $1")
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
