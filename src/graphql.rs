//! GraphQL schema for the API bridge.
//!
//! Mirrors the REST surface: query fields `workflows` and `vectorSearch`,
//! mutation field `triggerWorkflow`. Resolvers reuse the same n8n client and
//! vector-store code as the REST handlers; failures surface as GraphQL
//! errors carrying the upstream message.

use async_graphql::{Context, EmptySubscription, Object, Result, Schema, SimpleObject};
use chrono::Utc;

use crate::models::VectorSearchRequest;
use crate::n8n;
use crate::server::AppState;
use crate::vector;

pub type BridgeSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema with the shared [`AppState`] attached as context data.
pub fn build_schema(state: AppState) -> BridgeSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(state)
        .finish()
}

/// Workflow summary as reported by n8n's list endpoint.
#[derive(SimpleObject)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub active: bool,
    /// Number of nodes in the workflow graph.
    pub nodes: i32,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// A triggered workflow execution.
#[derive(SimpleObject)]
pub struct Execution {
    pub id: String,
    pub workflow_id: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
}

/// One vector search hit. `metadata` is the row's JSONB serialized to a
/// string, since GraphQL has no free-form object type here.
#[derive(SimpleObject)]
pub struct VectorResult {
    pub id: i64,
    pub content: String,
    pub similarity: f64,
    pub metadata: Option<String>,
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// All workflows known to the configured n8n instance.
    async fn workflows(&self, ctx: &Context<'_>) -> Result<Vec<Workflow>> {
        let state = ctx.data_unchecked::<AppState>();
        let client = n8n::N8nClient::new(
            &state.config.n8n.url,
            state.config.n8n.api_key.clone(),
            state.http.clone(),
        );

        let response = client.list_workflows().await?;
        Ok(map_workflows(&response))
    }

    /// Nearest-neighbor search over the embeddings store.
    async fn vector_search(
        &self,
        ctx: &Context<'_>,
        query_vector: Vec<f64>,
        #[graphql(default = 10)] limit: i64,
        #[graphql(default = 0.7)] threshold: f64,
    ) -> Result<Vec<VectorResult>> {
        let state = ctx.data_unchecked::<AppState>();

        let request = VectorSearchRequest {
            query_vector: query_vector.into_iter().map(|v| v as f32).collect(),
            limit,
            threshold,
        };
        request.validate()?;

        let response = vector::search(&state.pool, &request).await?;

        Ok(response
            .results
            .into_iter()
            .map(|r| VectorResult {
                id: r.id,
                content: r.content,
                similarity: r.similarity,
                metadata: r.metadata.as_ref().map(|m| m.to_string()),
            })
            .collect())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Trigger a workflow via its webhook. `data` is a JSON-encoded payload
    /// string (GraphQL has no free-form input object here).
    async fn trigger_workflow(
        &self,
        ctx: &Context<'_>,
        workflow_id: String,
        data: Option<String>,
    ) -> Result<Execution> {
        let state = ctx.data_unchecked::<AppState>();
        let client = n8n::N8nClient::new(
            &state.config.n8n.url,
            state.config.n8n.api_key.clone(),
            state.http.clone(),
        );

        let payload: serde_json::Value = match data {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| async_graphql::Error::new(format!("invalid data payload: {}", e)))?,
            None => serde_json::json!({}),
        };

        let workflow = client.get_workflow(&workflow_id).await?;
        let webhook_path = n8n::webhook_path(&workflow)
            .ok_or_else(|| async_graphql::Error::new("Workflow does not have a webhook trigger"))?;

        let execution_id = client
            .trigger_webhook(&webhook_path, &payload, &Default::default())
            .await?;

        Ok(Execution {
            id: execution_id,
            workflow_id,
            status: "triggered".to_string(),
            started_at: Utc::now().to_rfc3339(),
            finished_at: None,
        })
    }
}

/// Map n8n's `GET /api/v1/workflows` response (`{"data": [...]}`) into
/// [`Workflow`] summaries. Unknown or missing fields degrade to defaults
/// rather than failing the whole query.
fn map_workflows(response: &serde_json::Value) -> Vec<Workflow> {
    let Some(items) = response.get("data").and_then(|d| d.as_array()) else {
        return Vec::new();
    };

    items
        .iter()
        .map(|wf| Workflow {
            id: wf
                .get("id")
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default(),
            name: wf
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            active: wf.get("active").and_then(|v| v.as_bool()).unwrap_or(false),
            nodes: wf
                .get("nodes")
                .and_then(|v| v.as_array())
                .map(|n| n.len() as i32)
                .unwrap_or(0),
            created_at: wf
                .get("createdAt")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            updated_at: wf
                .get("updatedAt")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_workflows() {
        let response = json!({
            "data": [
                {
                    "id": "42",
                    "name": "order-intake",
                    "active": true,
                    "nodes": [{"type": "n8n-nodes-base.webhook"}, {"type": "n8n-nodes-base.set"}],
                    "createdAt": "2024-01-01T00:00:00Z",
                    "updatedAt": "2024-06-01T00:00:00Z"
                },
                {"id": 7, "name": "cleanup"}
            ]
        });

        let workflows = map_workflows(&response);
        assert_eq!(workflows.len(), 2);
        assert_eq!(workflows[0].id, "42");
        assert_eq!(workflows[0].name, "order-intake");
        assert!(workflows[0].active);
        assert_eq!(workflows[0].nodes, 2);
        assert_eq!(workflows[0].created_at.as_deref(), Some("2024-01-01T00:00:00Z"));

        // Numeric ids are stringified, missing fields degrade to defaults
        assert_eq!(workflows[1].id, "7");
        assert!(!workflows[1].active);
        assert_eq!(workflows[1].nodes, 0);
    }

    #[test]
    fn test_map_workflows_missing_data_key() {
        assert!(map_workflows(&json!({"unexpected": true})).is_empty());
    }
}
