//! Request and response shapes for the API bridge.
//!
//! These types mirror the external systems' schemas — n8n's workflow API and
//! the pgvector `embeddings` table. The bridge owns no domain model of its
//! own; the only logic here is bounds validation on search parameters.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body for `POST /api/v1/workflows/{id}/trigger`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WorkflowTriggerRequest {
    /// JSON payload forwarded to the workflow's webhook.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Extra headers forwarded to the webhook call.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

/// Result of a successful workflow trigger.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerResponse {
    pub execution_id: String,
    pub status: String,
    pub workflow_id: String,
    pub started_at: DateTime<Utc>,
}

/// Body for `POST /api/v1/vector/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorSearchRequest {
    /// Vector embedding to search with.
    pub query_vector: Vec<f32>,
    /// Maximum number of rows to return. Bounded to [1, 100].
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Minimum cosine similarity for a row to qualify. Bounded to [0.0, 1.0].
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_limit() -> i64 {
    10
}

fn default_threshold() -> f64 {
    0.7
}

impl VectorSearchRequest {
    pub fn validate(&self) -> Result<()> {
        if self.query_vector.is_empty() {
            bail!("query_vector must not be empty");
        }
        if !(1..=100).contains(&self.limit) {
            bail!("limit must be in [1, 100], got {}", self.limit);
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            bail!("threshold must be in [0.0, 1.0], got {}", self.threshold);
        }
        Ok(())
    }
}

/// One row returned by a vector search, ordered by ascending cosine distance.
#[derive(Debug, Clone, Serialize)]
pub struct VectorSearchResult {
    pub id: i64,
    pub content: String,
    pub similarity: f64,
    pub metadata: Option<serde_json::Value>,
}

/// Envelope for `POST /api/v1/vector/search`.
#[derive(Debug, Clone, Serialize)]
pub struct VectorSearchResponse {
    pub results: Vec<VectorSearchResult>,
    pub count: usize,
}

/// Body for `POST /api/v1/vector/insert`.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorInsertRequest {
    pub content: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Result of a successful vector insert.
#[derive(Debug, Clone, Serialize)]
pub struct VectorInsertResponse {
    pub id: i64,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(limit: i64, threshold: f64) -> VectorSearchRequest {
        VectorSearchRequest {
            query_vector: vec![0.1, 0.2, 0.3],
            limit,
            threshold,
        }
    }

    #[test]
    fn test_validate_accepts_bounds() {
        assert!(request(1, 0.0).validate().is_ok());
        assert!(request(100, 1.0).validate().is_ok());
        assert!(request(10, 0.7).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_limit_out_of_range() {
        assert!(request(0, 0.7).validate().is_err());
        assert!(request(101, 0.7).validate().is_err());
        assert!(request(-5, 0.7).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        assert!(request(10, -0.1).validate().is_err());
        assert!(request(10, 1.5).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_vector() {
        let req = VectorSearchRequest {
            query_vector: vec![],
            limit: 10,
            threshold: 0.7,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_search_request_defaults() {
        let req: VectorSearchRequest =
            serde_json::from_str(r#"{"query_vector": [0.5, 0.5]}"#).unwrap();
        assert_eq!(req.limit, 10);
        assert!((req.threshold - 0.7).abs() < f64::EPSILON);
    }
}
