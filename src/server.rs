//! The API bridge HTTP server.
//!
//! Exposes REST routes and a GraphQL endpoint that proxy requests to an n8n
//! instance and a Postgres/pgvector store. Every handler performs exactly one
//! outbound round trip — there is no shared mutable state between requests,
//! no caching, and no retry logic.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check |
//! | `GET`  | `/` | Service metadata and endpoint map |
//! | `GET`  | `/api/v1/workflows` | List n8n workflows (passthrough) |
//! | `POST` | `/api/v1/workflows/{id}/trigger` | Trigger a workflow via its webhook |
//! | `POST` | `/api/v1/vector/search` | pgvector nearest-neighbor search |
//! | `POST` | `/api/v1/vector/insert` | Insert one embedding row |
//! | `GET`/`POST` | `/graphql` | GraphQL schema (GraphiQL on GET) |
//!
//! # Error Contract
//!
//! All error responses use one JSON shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "limit must be in [1, 100], got 0" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (401), `upstream_error`
//! (500), `internal` (500). Upstream failures surface the n8n/Postgres error
//! message verbatim — there is no finer taxonomy.
//!
//! # API keys
//!
//! The `X-N8N-API-KEY` request header overrides the configured n8n API key
//! per request.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the bridge is meant to
//! sit behind the deployment's own ingress.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db;
use crate::graphql;
use crate::models::{
    TriggerResponse, VectorInsertRequest, VectorInsertResponse, VectorSearchRequest,
    VectorSearchResponse, WorkflowTriggerRequest,
};
use crate::n8n::{self, N8nClient};

/// Shared application state passed to all route handlers via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration (wrapped in `Arc` for cheap cloning across handlers).
    pub config: Arc<Config>,
    /// Shared outbound HTTP client for n8n calls.
    pub http: reqwest::Client,
    /// Lazy Postgres pool; connections open on first vector operation.
    pub pool: PgPool,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let pool = db::connect_lazy(&config)?;
        Ok(Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
            pool,
        })
    }

    /// Build an [`N8nClient`] for this request, honoring the
    /// `X-N8N-API-KEY` header override.
    fn n8n_client(&self, headers: &HeaderMap) -> N8nClient {
        let api_key = request_api_key(headers, &self.config);
        N8nClient::new(&self.config.n8n.url, api_key, self.http.clone())
    }
}

/// Resolve the API key for a request: header override first, then config.
fn request_api_key(headers: &HeaderMap, config: &Config) -> String {
    headers
        .get("X-N8N-API-KEY")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .unwrap_or_else(|| config.n8n.api_key.clone())
}

/// Starts the API bridge HTTP server.
///
/// Binds to the address configured in `[server].bind` and serves until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState::new(config.clone())?;
    let app = build_router(state);

    println!("API bridge listening on http://{}", bind_addr);
    tracing::info!(addr = %bind_addr, "starting api-bridge");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Assemble the full route table. Split out of [`run_server`] so tests can
/// drive the router in-process.
pub fn build_router(state: AppState) -> Router {
    let schema = graphql::build_schema(state.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/", get(handle_root))
        .route("/api/v1/workflows", get(handle_list_workflows))
        .route(
            "/api/v1/workflows/{id}/trigger",
            post(handle_trigger_workflow),
        )
        .route("/api/v1/vector/search", post(handle_vector_search))
        .route("/api/v1/vector/insert", post(handle_vector_insert))
        .route(
            "/graphql",
            get(handle_graphiql).post_service(async_graphql_axum::GraphQL::new(schema)),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 401 Unauthorized error.
fn unauthorized(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 error for failed n8n round trips.
fn upstream_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "upstream_error".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 error for database failures.
fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
}

/// Health check used by load balancers and the docker-compose healthcheck.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "api-bridge".to_string(),
    })
}

// ============ GET / ============

/// JSON response body for `GET /`.
#[derive(Serialize)]
struct RootResponse {
    service: String,
    version: String,
    endpoints: serde_json::Value,
}

/// Service metadata and a map of where everything lives.
async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        service: "n8n API Bridge".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: serde_json::json!({
            "rest": "/api/v1",
            "graphql": "/graphql",
            "health": "/health",
        }),
    })
}

// ============ GET /api/v1/workflows ============

/// List all n8n workflows. Raw passthrough of n8n's response body.
///
/// Returns `401` when no API key is available from the header override or
/// configuration, `500` when the n8n round trip fails.
async fn handle_list_workflows(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    if request_api_key(&headers, &state.config).is_empty() {
        return Err(unauthorized("API key required"));
    }

    let client = state.n8n_client(&headers);
    let workflows = client
        .list_workflows()
        .await
        .map_err(|e| upstream_error(format!("Failed to fetch workflows: {}", e)))?;

    Ok(Json(workflows))
}

// ============ POST /api/v1/workflows/{id}/trigger ============

/// Trigger an n8n workflow via its webhook.
///
/// Looks the workflow up, extracts the first webhook trigger's path, and
/// POSTs the supplied payload to it. Returns `400` when the workflow has no
/// webhook trigger.
async fn handle_trigger_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<WorkflowTriggerRequest>,
) -> Result<Json<TriggerResponse>, AppError> {
    let client = state.n8n_client(&headers);

    let workflow = client
        .get_workflow(&workflow_id)
        .await
        .map_err(|e| upstream_error(format!("Failed to trigger workflow: {}", e)))?;

    let webhook_path = n8n::webhook_path(&workflow)
        .ok_or_else(|| bad_request("Workflow does not have a webhook trigger"))?;

    let payload = request.data.unwrap_or_else(|| serde_json::json!({}));
    let extra_headers = request.headers.unwrap_or_default();

    let execution_id = client
        .trigger_webhook(&webhook_path, &payload, &extra_headers)
        .await
        .map_err(|e| upstream_error(format!("Failed to trigger workflow: {}", e)))?;

    Ok(Json(TriggerResponse {
        execution_id,
        status: "triggered".to_string(),
        workflow_id,
        started_at: Utc::now(),
    }))
}

// ============ POST /api/v1/vector/search ============

/// Nearest-neighbor search using pgvector cosine distance.
///
/// Parameter validation happens before any database connection is opened, so
/// out-of-range `limit`/`threshold` values are `400`s even when Postgres is
/// down.
async fn handle_vector_search(
    State(state): State<AppState>,
    Json(request): Json<VectorSearchRequest>,
) -> Result<Json<VectorSearchResponse>, AppError> {
    request.validate().map_err(|e| bad_request(e.to_string()))?;

    let response = crate::vector::search(&state.pool, &request)
        .await
        .map_err(|e| internal(format!("Vector search failed: {}", e)))?;

    Ok(Json(response))
}

// ============ POST /api/v1/vector/insert ============

/// Insert one embedding row; returns its generated id.
async fn handle_vector_insert(
    State(state): State<AppState>,
    Json(request): Json<VectorInsertRequest>,
) -> Result<Json<VectorInsertResponse>, AppError> {
    if request.embedding.is_empty() {
        return Err(bad_request("embedding must not be empty"));
    }

    let response = crate::vector::insert(&state.pool, &request)
        .await
        .map_err(|e| internal(format!("Vector insert failed: {}", e)))?;

    Ok(Json(response))
}

// ============ GET /graphql ============

/// GraphiQL playground pointing at the POST endpoint.
async fn handle_graphiql() -> impl IntoResponse {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}
