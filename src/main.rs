//! # n8n Bridge CLI (`n8nb`)
//!
//! The `n8nb` binary bundles the n8n integration utilities behind one
//! command: the API bridge server, database initialization, and the small
//! scripts n8n workflows invoke through Execute Command nodes.
//!
//! ## Usage
//!
//! ```bash
//! n8nb [--config ./n8nb.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `n8nb serve` | Start the REST/GraphQL API bridge |
//! | `n8nb init` | Create the pgvector extension and embeddings table |
//! | `n8nb chat [PROMPT]` | One OpenRouter chat completion, JSON on stdout |
//! | `n8nb grpc` | Templated gRPC client call (demonstration) |
//! | `n8nb query-hash <FILE>` | Persisted-query SHA-256 hash + sidecar file |
//!
//! ## Examples
//!
//! ```bash
//! # Start the bridge against a local n8n + Postgres
//! N8N_URL=http://localhost:5678 N8N_API_KEY=... n8nb serve
//!
//! # Ask a model from inside a workflow
//! echo '{"query": "Summarize this order"}' | n8nb chat
//!
//! # Hash a persisted query
//! n8nb query-hash queries/get-workflows.graphql
//! ```
//!
//! Configuration is read from an optional TOML file; the environment
//! variables `N8N_URL`, `N8N_API_KEY`, `POSTGRES_URL`, and
//! `OPENROUTER_API_KEY` always override it.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use n8n_bridge::{chat_cmd, config, grpc_cmd, migrate, query_hash, server};

/// n8n Bridge — REST/GraphQL API bridge and integration utilities for the
/// n8n workflow platform.
#[derive(Parser)]
#[command(
    name = "n8nb",
    about = "REST and GraphQL API bridge plus integration utilities for the n8n workflow platform",
    version,
    long_about = "n8n Bridge exposes an n8n instance and a Postgres/pgvector store over REST and \
    GraphQL, and ships the helper commands (OpenRouter chat, templated gRPC call, persisted-query \
    hashing) that n8n workflows shell out to."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Optional; when omitted, defaults are used. The environment variables
    /// N8N_URL, N8N_API_KEY, POSTGRES_URL, and OPENROUTER_API_KEY override
    /// file values either way.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the API bridge HTTP server.
    ///
    /// Serves the REST routes under /api/v1, the GraphQL endpoint at
    /// /graphql, and /health. Binds to [server].bind (default 0.0.0.0:8000).
    Serve,

    /// Initialize the embeddings schema.
    ///
    /// Creates the pgvector extension, the embeddings table, and a cosine
    /// ivfflat index. Idempotent — running it multiple times is safe.
    Init,

    /// Call the OpenRouter chat-completions API once.
    ///
    /// The prompt comes from the positional argument, from piped stdin JSON
    /// ({"query": "..."}), or a default. Prints a JSON result object to
    /// stdout; exits non-zero on failure or when OPENROUTER_API_KEY is unset.
    Chat {
        /// The user message. Overrides stdin input.
        prompt: Option<String>,

        /// Model identifier (any model from openrouter.ai/models).
        #[arg(long)]
        model: Option<String>,

        /// Maximum tokens to generate.
        #[arg(long)]
        max_tokens: Option<u32>,
    },

    /// Make a templated gRPC call (demonstration only).
    ///
    /// Opens a channel to the given host:port and prints the canned response
    /// a generated-stub client would produce. Flags can be overridden by
    /// piped stdin JSON, matching how n8n passes node parameters.
    Grpc {
        /// gRPC service host.
        #[arg(long, default_value = "localhost")]
        host: String,

        /// gRPC service port.
        #[arg(long, default_value_t = 50051)]
        port: u16,

        /// Service name (for the templated response).
        #[arg(long, default_value = "ExampleService")]
        service: String,

        /// Method name (for the templated response).
        #[arg(long, default_value = "GetData")]
        method: String,

        /// Request parameters as a JSON object.
        #[arg(long)]
        data: Option<String>,

        /// Use TLS for the channel.
        #[arg(long)]
        tls: bool,

        /// Request timeout in seconds.
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },

    /// Generate a SHA-256 persisted-query hash for a GraphQL query file.
    ///
    /// Prints the hash and an extensions snippet, and writes a sidecar
    /// `.hash` file next to the query.
    QueryHash {
        /// Path to the query file.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Chat {
            prompt,
            model,
            max_tokens,
        } => chat_cmd::run_chat(&cfg, prompt, model, max_tokens).await,
        Commands::Grpc {
            host,
            port,
            service,
            method,
            data,
            tls,
            timeout,
        } => {
            let data = match data {
                Some(raw) => serde_json::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("--data is not valid JSON: {}", e))?,
                None => serde_json::json!({}),
            };
            grpc_cmd::run_grpc(grpc_cmd::GrpcCall {
                host,
                port,
                service,
                method,
                data,
                tls,
                timeout_secs: timeout,
            })
            .await
        }
        Commands::QueryHash { file } => {
            query_hash::run_query_hash(&file)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
