//! # n8n Bridge
//!
//! Integration utilities for the n8n workflow-automation platform: an HTTP
//! API bridge exposing REST and GraphQL endpoints, plus the small
//! command-line tools the deployment's workflows shell out to.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌────────────────┐
//!        REST ───▶ │                │ ───▶ n8n REST API
//!                  │   api-bridge   │
//!     GraphQL ───▶ │    (axum)      │ ───▶ Postgres + pgvector
//!                  └────────────────┘
//!
//!   n8nb chat ──────▶ OpenRouter chat completions
//!   n8nb grpc ──────▶ tonic channel (templated demo)
//!   n8nb query-hash ─▶ SHA-256 sidecar file
//! ```
//!
//! Every component is a leaf wrapper: read input, make one external call,
//! serialize output. Nothing in this crate talks to anything else in this
//! crate at runtime, and no state is owned here — workflows live in n8n,
//! embeddings live in Postgres.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with environment overrides |
//! | [`server`] | REST routes and the HTTP server |
//! | [`graphql`] | GraphQL schema (`workflows`, `vectorSearch`, `triggerWorkflow`) |
//! | [`n8n`] | n8n REST client and webhook-path extraction |
//! | [`vector`] | pgvector search/insert |
//! | [`openrouter`] | OpenRouter chat-completions client |
//! | [`chat_cmd`] | `chat` subcommand |
//! | [`grpc_cmd`] | `grpc` subcommand (templated client) |
//! | [`query_hash`] | `query-hash` subcommand |
//! | [`db`] | Postgres connection pools |
//! | [`migrate`] | `init` schema setup |
//! | [`models`] | Request/response types and validation |

pub mod chat_cmd;
pub mod config;
pub mod db;
pub mod graphql;
pub mod grpc_cmd;
pub mod migrate;
pub mod models;
pub mod n8n;
pub mod openrouter;
pub mod query_hash;
pub mod server;
pub mod vector;
