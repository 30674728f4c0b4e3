use anyhow::Result;
use sqlx::SqlitePool;

/// Create the collection schema. Idempotent.
///
/// Each corpus lives in its own database file, so `collection` holds at
/// most one row.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collection (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            corpus TEXT NOT NULL,
            embedder TEXT NOT NULL,
            dims INTEGER NOT NULL,
            record_count INTEGER NOT NULL,
            fingerprint TEXT NOT NULL,
            ingested_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Insertion order is the rowid order of `seq`.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            seq INTEGER PRIMARY KEY,
            source_identifier TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            char_offset INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_records_source ON records(source_identifier, chunk_index)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
