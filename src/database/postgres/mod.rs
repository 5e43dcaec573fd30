use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection, Postgres, Transaction};
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::database::postgres::models::{ChunkRecord, DistanceMetric, NewChunk, ScoredChunk};
use crate::database::postgres::queries::{ChunkQueries, TABLE_NAME};
use crate::{RagError, Result};


pub mod models;
pub mod queries;

/// The single PostgreSQL session used for a whole run
#[derive(Debug)]
pub struct VectorStore {
    conn: PgConnection,
    database: String,
    dimension: u32,
}

impl VectorStore {
    /// Open one connection to the configured database
    #[inline]
    pub async fn connect(config: &DatabaseConfig, dimension: u32) -> Result<Self> {
        let address = config.address();
        info!("Connecting to PostgreSQL at {}", address);

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password);

        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|source| RagError::Connection { address, source })?;

        debug!("PostgreSQL connection established");
        Ok(Self {
            conn,
            database: config.name.clone(),
            dimension,
        })
    }

    /// Connect, require pgvector and start from an empty `documents` table
    #[inline]
    pub async fn initialize(config: &DatabaseConfig, dimension: u32) -> Result<Self> {
        let mut store = Self::connect(config, dimension).await?;

        let prepared = match store.ensure_vector_extension().await {
            Ok(()) => store.reset_table().await,
            Err(e) => Err(e),
        };

        match prepared {
            Ok(()) => Ok(store),
            Err(e) => {
                if let Err(close_err) = store.close().await {
                    warn!("Failed to close PostgreSQL connection: {}", close_err);
                }
                Err(e)
            }
        }
    }

    #[inline]
    pub async fn has_vector_extension(&mut self) -> Result<bool> {
        ChunkQueries::vector_extension_installed(&mut self.conn).await
    }

    /// Fails with [`RagError::MissingVectorExtension`] when pgvector is absent.
    /// The extension is never created here.
    #[inline]
    pub async fn ensure_vector_extension(&mut self) -> Result<()> {
        if self.has_vector_extension().await? {
            info!("pgvector extension is installed");
            Ok(())
        } else {
            Err(RagError::MissingVectorExtension {
                database: self.database.clone(),
            })
        }
    }

    /// Drop and recreate the chunk table
    #[inline]
    pub async fn reset_table(&mut self) -> Result<()> {
        ChunkQueries::drop_table(&mut self.conn).await?;
        ChunkQueries::create_table(&mut self.conn, self.dimension).await?;
        info!(
            "Table '{}' created with a VECTOR({}) column",
            TABLE_NAME, self.dimension
        );
        Ok(())
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension as usize
    }

    /// Start a batch of inserts that becomes visible only on [`ChunkWriter::commit`]
    #[inline]
    pub async fn writer(&mut self) -> Result<ChunkWriter<'_>> {
        let dimension = self.dimension();
        let tx = self.conn.begin().await?;
        Ok(ChunkWriter {
            tx,
            dimension,
            inserted: 0,
        })
    }

    /// Insert a single chunk outside of any batch
    #[inline]
    pub async fn insert_chunk(&mut self, chunk: &NewChunk) -> Result<i32> {
        ensure_dimension(self.dimension(), &chunk.embedding)?;
        ChunkQueries::insert(&mut self.conn, chunk).await
    }

    /// Up to `limit` stored chunks ordered by non-decreasing distance to `query`
    #[inline]
    pub async fn nearest(
        &mut self,
        query: &[f32],
        metric: DistanceMetric,
        limit: u32,
    ) -> Result<Vec<ScoredChunk>> {
        ensure_dimension(self.dimension(), query)?;
        ChunkQueries::nearest(&mut self.conn, query, metric, i64::from(limit)).await
    }

    #[inline]
    pub async fn count(&mut self) -> Result<i64> {
        ChunkQueries::count(&mut self.conn).await
    }

    #[inline]
    pub async fn chunks(&mut self) -> Result<Vec<ChunkRecord>> {
        ChunkQueries::list_all(&mut self.conn).await
    }

    #[inline]
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        debug!("PostgreSQL connection closed");
        Ok(())
    }
}

/// Inserts that share one transaction. Dropping the writer without
/// committing rolls every insert back.
pub struct ChunkWriter<'c> {
    tx: Transaction<'c, Postgres>,
    dimension: usize,
    inserted: usize,
}

impl ChunkWriter<'_> {
    #[inline]
    pub async fn insert(&mut self, chunk: &NewChunk) -> Result<i32> {
        ensure_dimension(self.dimension, &chunk.embedding)?;
        let id = ChunkQueries::insert(&mut self.tx, chunk).await?;
        self.inserted += 1;
        Ok(id)
    }

    #[inline]
    pub fn inserted(&self) -> usize {
        self.inserted
    }

    #[inline]
    pub async fn commit(self) -> Result<usize> {
        self.tx.commit().await?;
        debug!("Committed {} chunk inserts", self.inserted);
        Ok(self.inserted)
    }
}

/// Every vector written to or compared against the table must match the column width
#[inline]
pub fn ensure_dimension(expected: usize, embedding: &[f32]) -> Result<()> {
    if embedding.len() == expected {
        Ok(())
    } else {
        Err(RagError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        })
    }
}
