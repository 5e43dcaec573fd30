
use pgvector::Vector;
use sqlx::PgConnection;
use tracing::debug;

use super::models::{ChunkRecord, DistanceMetric, NewChunk, ScoredChunk};
use crate::Result;

/// Name of the single table holding chunk records
pub const TABLE_NAME: &str = "documents";

pub struct ChunkQueries;

impl ChunkQueries {
    #[inline]
    pub async fn vector_extension_installed(conn: &mut PgConnection) -> Result<bool> {
        let row: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM pg_extension WHERE extname = 'vector'")
                .fetch_optional(&mut *conn)
                .await?;

        Ok(row.is_some())
    }

    #[inline]
    pub async fn drop_table(conn: &mut PgConnection) -> Result<()> {
        sqlx::query(&drop_table_sql()).execute(&mut *conn).await?;
        debug!("Dropped table {} if it existed", TABLE_NAME);
        Ok(())
    }

    #[inline]
    pub async fn create_table(conn: &mut PgConnection, dimension: u32) -> Result<()> {
        sqlx::query(&create_table_sql(dimension))
            .execute(&mut *conn)
            .await?;
        debug!("Created table {} with VECTOR({})", TABLE_NAME, dimension);
        Ok(())
    }

    /// Insert a chunk and return its generated id
    #[inline]
    pub async fn insert(conn: &mut PgConnection, chunk: &NewChunk) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(&insert_sql())
            .bind(&chunk.content)
            .bind(Vector::from(chunk.embedding.clone()))
            .fetch_one(&mut *conn)
            .await?;

        Ok(id)
    }

    /// Rank stored chunks by distance to `query`, closest first
    #[inline]
    pub async fn nearest(
        conn: &mut PgConnection,
        query: &[f32],
        metric: DistanceMetric,
        limit: i64,
    ) -> Result<Vec<ScoredChunk>> {
        let chunks = sqlx::query_as::<_, ScoredChunk>(&nearest_sql(metric))
            .bind(Vector::from(query.to_vec()))
            .bind(limit)
            .fetch_all(&mut *conn)
            .await?;

        debug!(
            "Nearest-neighbour query ({}) returned {} rows",
            metric,
            chunks.len()
        );
        Ok(chunks)
    }

    #[inline]
    pub async fn count(conn: &mut PgConnection) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {TABLE_NAME}"))
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }

    /// All stored chunks in insertion order
    #[inline]
    pub async fn list_all(conn: &mut PgConnection) -> Result<Vec<ChunkRecord>> {
        let records = sqlx::query_as::<_, ChunkRecord>(&format!(
            "SELECT id, content, embedding FROM {TABLE_NAME} ORDER BY id"
        ))
        .fetch_all(&mut *conn)
        .await?;

        Ok(records)
    }
}

fn drop_table_sql() -> String {
    format!("DROP TABLE IF EXISTS {TABLE_NAME}")
}

fn create_table_sql(dimension: u32) -> String {
    format!(
        "CREATE TABLE {TABLE_NAME} (id SERIAL PRIMARY KEY, content TEXT, embedding VECTOR({dimension}))"
    )
}

fn insert_sql() -> String {
    format!("INSERT INTO {TABLE_NAME} (content, embedding) VALUES ($1, $2) RETURNING id")
}

fn nearest_sql(metric: DistanceMetric) -> String {
    let op = metric.operator();
    format!(
        "SELECT id, content, (embedding {op} $1)::float8 AS distance \
         FROM {TABLE_NAME} ORDER BY embedding {op} $1 LIMIT $2"
    )
}
