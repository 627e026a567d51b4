use anyhow::Result;

use crate::config::Config;
use crate::db;

/// Create the pgvector extension and the `embeddings` table.
///
/// Idempotent — `n8nb init` can be re-run safely. The vector dimension is
/// fixed at table-creation time from `database.embedding_dims` (default 1536,
/// sized for text-embedding-ada-002 vectors).
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
        .execute(&pool)
        .await?;

    // Dimension is part of the column type, so it is interpolated into the
    // DDL rather than bound. Validated > 0 at config load.
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS embeddings (
            id BIGSERIAL PRIMARY KEY,
            content TEXT NOT NULL,
            embedding vector({}) NOT NULL,
            metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
        config.database.embedding_dims
    ))
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_embeddings_embedding
        ON embeddings USING ivfflat (embedding vector_cosine_ops)
        WITH (lists = 100)
        "#,
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
