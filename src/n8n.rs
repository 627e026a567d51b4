//! HTTP client for the n8n REST API.
//!
//! Thin passthrough to a configured n8n instance: list workflows, fetch a
//! single workflow, and trigger a workflow by POSTing to its webhook path.
//! Responses are forwarded as raw JSON — the bridge does not reshape n8n's
//! schemas. Errors carry the upstream status and body; there are no retries.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Node type that marks a workflow as webhook-triggerable.
pub const WEBHOOK_NODE_TYPE: &str = "n8n-nodes-base.webhook";

/// Timeout for workflow metadata lookups.
const API_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for webhook executions, which run the workflow synchronously.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one n8n instance.
///
/// Carries the API key resolved for the current request — the configured key
/// or a per-request `X-N8N-API-KEY` header override.
pub struct N8nClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl N8nClient {
    pub fn new(base_url: &str, api_key: String, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
        }
    }

    /// `GET /api/v1/workflows` — raw JSON passthrough.
    pub async fn list_workflows(&self) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(format!("{}/api/v1/workflows", self.base_url))
            .header("X-N8N-API-KEY", &self.api_key)
            .timeout(API_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("n8n API error {}: {}", status, body);
        }

        Ok(response.json().await?)
    }

    /// `GET /api/v1/workflows/{id}` — raw JSON passthrough.
    pub async fn get_workflow(&self, id: &str) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(format!("{}/api/v1/workflows/{}", self.base_url, id))
            .header("X-N8N-API-KEY", &self.api_key)
            .timeout(API_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("n8n API error {}: {}", status, body);
        }

        Ok(response.json().await?)
    }

    /// POST a payload to `{base}/webhook/{path}` and return the execution id.
    ///
    /// The execution id comes from the `X-Execution-Id` response header; n8n
    /// omits it in some configurations, in which case `"unknown"` is returned.
    pub async fn trigger_webhook(
        &self,
        webhook_path: &str,
        payload: &serde_json::Value,
        headers: &HashMap<String, String>,
    ) -> Result<String> {
        let mut request = self
            .http
            .post(format!("{}/webhook/{}", self.base_url, webhook_path))
            .timeout(WEBHOOK_TIMEOUT)
            .json(payload);

        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("webhook error {}: {}", status, body);
        }

        let execution_id = response
            .headers()
            .get("X-Execution-Id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Ok(execution_id)
    }
}

/// Extract the webhook path from a workflow's node list.
///
/// Scans `nodes[]` for the first node of type [`WEBHOOK_NODE_TYPE`] that has
/// a `parameters.path`. Returns `None` when the workflow has no webhook
/// trigger — the caller turns that into a client error.
pub fn webhook_path(workflow: &serde_json::Value) -> Option<String> {
    let nodes = workflow.get("nodes")?.as_array()?;

    for node in nodes {
        if node.get("type").and_then(|t| t.as_str()) != Some(WEBHOOK_NODE_TYPE) {
            continue;
        }
        if let Some(path) = node
            .get("parameters")
            .and_then(|p| p.get("path"))
            .and_then(|p| p.as_str())
        {
            return Some(path.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_webhook_path_found() {
        let workflow = json!({
            "id": "wf-1",
            "nodes": [
                {"type": "n8n-nodes-base.start", "parameters": {}},
                {"type": "n8n-nodes-base.webhook", "parameters": {"path": "incoming-order"}},
            ]
        });
        assert_eq!(webhook_path(&workflow).as_deref(), Some("incoming-order"));
    }

    #[test]
    fn test_webhook_path_takes_first_webhook_node() {
        let workflow = json!({
            "nodes": [
                {"type": "n8n-nodes-base.webhook", "parameters": {"path": "first"}},
                {"type": "n8n-nodes-base.webhook", "parameters": {"path": "second"}},
            ]
        });
        assert_eq!(webhook_path(&workflow).as_deref(), Some("first"));
    }

    #[test]
    fn test_webhook_path_missing() {
        let workflow = json!({
            "nodes": [
                {"type": "n8n-nodes-base.httpRequest", "parameters": {"url": "http://x"}},
            ]
        });
        assert!(webhook_path(&workflow).is_none());
    }

    #[test]
    fn test_webhook_path_ignores_webhook_without_path() {
        let workflow = json!({
            "nodes": [
                {"type": "n8n-nodes-base.webhook", "parameters": {}},
                {"type": "n8n-nodes-base.webhook", "parameters": {"path": "fallback"}},
            ]
        });
        assert_eq!(webhook_path(&workflow).as_deref(), Some("fallback"));
    }

    #[test]
    fn test_webhook_path_no_nodes_key() {
        assert!(webhook_path(&json!({"id": "wf-2"})).is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = N8nClient::new("http://n8n:5678/", String::new(), reqwest::Client::new());
        assert_eq!(client.base_url, "http://n8n:5678");
    }
}
