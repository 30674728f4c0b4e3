//! SQLite-backed [`VectorStore`] implementation.
//!
//! Each corpus gets its own database file (`<dir>/code.sqlite`,
//! `<dir>/practices.sqlite`), so the two collections never share rows.
//! Replacing a collection runs in one transaction; under WAL, concurrent
//! searches keep reading the previous snapshot until it commits.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use dev_documento_core::embedding::{blob_to_vec, vec_to_blob};
use dev_documento_core::store::{
    check_embedder, check_query_dims, describe_collection, top_k, VectorStore,
};
use dev_documento_core::{Chunk, CollectionInfo, Corpus, EmbeddingRecord, RagError, SearchHit};

use crate::db;
use crate::migrate;

/// Database file for `corpus` under `dir`.
pub fn corpus_db_path(dir: &Path, corpus: Corpus) -> PathBuf {
    dir.join(format!("{}.sqlite", corpus))
}

pub struct SqliteStore {
    code: SqlitePool,
    practices: SqlitePool,
}

impl SqliteStore {
    /// Open (creating and migrating if needed) both corpus databases.
    pub async fn open(dir: &Path) -> anyhow::Result<Self> {
        let code = db::connect(&corpus_db_path(dir, Corpus::Code)).await?;
        migrate::run_migrations(&code).await?;
        let practices = db::connect(&corpus_db_path(dir, Corpus::Practices)).await?;
        migrate::run_migrations(&practices).await?;
        Ok(Self { code, practices })
    }

    fn pool(&self, corpus: Corpus) -> &SqlitePool {
        match corpus {
            Corpus::Code => &self.code,
            Corpus::Practices => &self.practices,
        }
    }
}

async fn read_info<'c, E>(executor: E, corpus: Corpus) -> Result<Option<CollectionInfo>, RagError>
where
    E: sqlx::Executor<'c, Database = sqlx::Sqlite>,
{
    let row = sqlx::query(
        "SELECT embedder, dims, record_count, fingerprint, ingested_at FROM collection WHERE id = 1",
    )
    .fetch_optional(executor)
    .await
    .map_err(RagError::store)?;

    Ok(row.map(|row| CollectionInfo {
        corpus,
        embedder: row.get("embedder"),
        dims: row.get::<i64, _>("dims") as usize,
        record_count: row.get::<i64, _>("record_count") as usize,
        fingerprint: row.get("fingerprint"),
        ingested_at: row.get("ingested_at"),
    }))
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn upsert_corpus(
        &self,
        corpus: Corpus,
        embedder: &str,
        records: Vec<EmbeddingRecord>,
    ) -> Result<CollectionInfo, RagError> {
        let info = describe_collection(corpus, embedder, &records)?;
        let mut tx = self.pool(corpus).begin().await.map_err(RagError::store)?;

        sqlx::query("DELETE FROM records")
            .execute(&mut *tx)
            .await
            .map_err(RagError::store)?;
        sqlx::query("DELETE FROM collection")
            .execute(&mut *tx)
            .await
            .map_err(RagError::store)?;

        for (seq, record) in records.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO records (seq, source_identifier, chunk_index, char_offset, text, embedding)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(seq as i64)
            .bind(&record.chunk.source_identifier)
            .bind(record.chunk.chunk_index as i64)
            .bind(record.chunk.offset as i64)
            .bind(&record.chunk.text)
            .bind(vec_to_blob(&record.vector))
            .execute(&mut *tx)
            .await
            .map_err(RagError::store)?;
        }

        sqlx::query(
            r#"
            INSERT INTO collection (id, corpus, embedder, dims, record_count, fingerprint, ingested_at)
            VALUES (1, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(corpus.as_str())
        .bind(&info.embedder)
        .bind(info.dims as i64)
        .bind(info.record_count as i64)
        .bind(&info.fingerprint)
        .bind(info.ingested_at)
        .execute(&mut *tx)
        .await
        .map_err(RagError::store)?;

        tx.commit().await.map_err(RagError::store)?;
        Ok(info)
    }

    async fn search(
        &self,
        corpus: Corpus,
        embedder: &str,
        query_vec: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>, RagError> {
        // One read transaction so metadata and records come from the same snapshot.
        let mut tx = self.pool(corpus).begin().await.map_err(RagError::store)?;

        let info = read_info(&mut *tx, corpus)
            .await?
            .ok_or(RagError::StoreNotFound(corpus))?;
        check_embedder(&info, embedder)?;
        check_query_dims(&info, query_vec)?;

        let rows = sqlx::query(
            "SELECT source_identifier, chunk_index, char_offset, text, embedding FROM records ORDER BY seq",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(RagError::store)?;
        tx.commit().await.map_err(RagError::store)?;

        let vectors: Vec<Vec<f32>> = rows
            .iter()
            .map(|row| blob_to_vec(&row.get::<Vec<u8>, _>("embedding")))
            .collect();
        let ranked = top_k(query_vec, vectors.iter().map(|v| v.as_slice()), k);

        Ok(ranked
            .into_iter()
            .map(|(i, score)| {
                let row = &rows[i];
                SearchHit {
                    chunk: Chunk {
                        text: row.get("text"),
                        source_identifier: row.get("source_identifier"),
                        offset: row.get::<i64, _>("char_offset") as usize,
                        chunk_index: row.get::<i64, _>("chunk_index") as usize,
                        corpus,
                    },
                    score,
                }
            })
            .collect())
    }

    async fn collection_info(&self, corpus: Corpus) -> Result<Option<CollectionInfo>, RagError> {
        read_info(self.pool(corpus), corpus).await
    }

    async fn close(&self) {
        self.code.close().await;
        self.practices.close().await;
    }
}
