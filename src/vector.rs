//! Vector search and insert against a Postgres/pgvector `embeddings` table.
//!
//! Each operation is a single parameterized statement using pgvector's
//! cosine-distance operator `<=>`. Similarity is reported as
//! `1 - distance`, so `1.0` is an exact match and rows come back ordered
//! by ascending distance (best match first).

use anyhow::Result;
use pgvector::Vector;
use sqlx::{PgPool, Row};

use crate::models::{
    VectorInsertRequest, VectorInsertResponse, VectorSearchRequest, VectorSearchResponse,
    VectorSearchResult,
};

/// Nearest-neighbor search over the `embeddings` table.
///
/// The caller is responsible for validating the request first
/// ([`VectorSearchRequest::validate`]) so parameter errors become 400s
/// instead of being mixed in with database failures.
pub async fn search(pool: &PgPool, request: &VectorSearchRequest) -> Result<VectorSearchResponse> {
    let query_vector = Vector::from(request.query_vector.clone());

    let rows = sqlx::query(
        r#"
        SELECT
            id,
            content,
            metadata,
            1 - (embedding <=> $1) AS similarity
        FROM embeddings
        WHERE 1 - (embedding <=> $1) >= $2
        ORDER BY embedding <=> $1
        LIMIT $3
        "#,
    )
    .bind(query_vector)
    .bind(request.threshold)
    .bind(request.limit)
    .fetch_all(pool)
    .await?;

    let results: Vec<VectorSearchResult> = rows
        .iter()
        .map(|row| VectorSearchResult {
            id: row.get("id"),
            content: row.get("content"),
            similarity: row.get("similarity"),
            metadata: row.get("metadata"),
        })
        .collect();

    let count = results.len();
    Ok(VectorSearchResponse { results, count })
}

/// Append one row to the `embeddings` table and return its generated id.
pub async fn insert(pool: &PgPool, request: &VectorInsertRequest) -> Result<VectorInsertResponse> {
    let embedding = Vector::from(request.embedding.clone());
    let metadata = request
        .metadata
        .clone()
        .unwrap_or_else(|| serde_json::json!({}));

    let row = sqlx::query(
        r#"
        INSERT INTO embeddings (content, embedding, metadata)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(&request.content)
    .bind(embedding)
    .bind(&metadata)
    .fetch_one(pool)
    .await?;

    Ok(VectorInsertResponse {
        id: row.get("id"),
        status: "inserted".to_string(),
    })
}
