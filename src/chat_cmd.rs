//! The `chat` subcommand: one OpenRouter chat-completion round trip.
//!
//! Designed to run inside an n8n Execute Command node: the prompt can come
//! from a positional argument, from piped stdin JSON (`{"query": "..."}`
//! emitted by a previous node), or fall back to a default. The result is a
//! single JSON object on stdout; failures exit non-zero with a
//! `"success": false` envelope.

use anyhow::Result;
use serde_json::json;
use std::process::ExitCode;

use crate::config::Config;
use crate::openrouter::OpenRouterClient;

const DEFAULT_PROMPT: &str = "Hello, how are you?";

pub async fn run_chat(
    config: &Config,
    prompt: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
) -> Result<ExitCode> {
    let api_key = match config.openrouter.api_key.as_deref() {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => {
            let result = json!({
                "success": false,
                "error": "OPENROUTER_API_KEY not set",
                "hint": "Set OPENROUTER_API_KEY in .env or n8n environment variables",
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(ExitCode::FAILURE);
        }
    };

    let query = resolve_prompt(prompt);
    let model = model.unwrap_or_else(|| config.openrouter.model.clone());
    let max_tokens = max_tokens.unwrap_or(config.openrouter.max_tokens);

    let client = OpenRouterClient::new(api_key, &config.openrouter);

    match client.chat(&model, &query, max_tokens).await {
        Ok(completion) => {
            let result = json!({
                "success": true,
                "query": query,
                "model": completion.model,
                "response": completion.text,
                "usage": completion.usage,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let result = json!({
                "success": false,
                "error": e.to_string(),
                "error_type": error_kind(&e),
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Prompt precedence: positional argument, then piped stdin JSON's `query`
/// field, then the default.
fn resolve_prompt(arg: Option<String>) -> String {
    if let Some(prompt) = arg {
        return prompt;
    }

    if !atty::is(atty::Stream::Stdin) {
        if let Ok(input) = std::io::read_to_string(std::io::stdin()) {
            if let Some(query) = extract_query(&input) {
                return query;
            }
        }
    }

    DEFAULT_PROMPT.to_string()
}

/// Pull `query` out of a JSON document, tolerating malformed input.
fn extract_query(input: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(input).ok()?;
    value
        .get("query")
        .and_then(|q| q.as_str())
        .map(|q| q.to_string())
}

/// Coarse classification for the error envelope. Matches on the reqwest
/// failure mode where one is available; status-level failures from the
/// client are reported as `api_error`.
fn error_kind(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<reqwest::Error>() {
        if e.is_timeout() {
            "timeout"
        } else if e.is_connect() {
            "connect_error"
        } else if e.is_decode() {
            "decode_error"
        } else {
            "request_error"
        }
    } else {
        "api_error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_query() {
        assert_eq!(
            extract_query(r#"{"query": "What is n8n?"}"#).as_deref(),
            Some("What is n8n?")
        );
        assert!(extract_query(r#"{"other": 1}"#).is_none());
        assert!(extract_query("not json").is_none());
        assert!(extract_query(r#"{"query": 42}"#).is_none());
    }

    #[test]
    fn test_error_kind_non_reqwest() {
        let err = anyhow::anyhow!("OpenRouter API error 402: insufficient credits");
        assert_eq!(error_kind(&err), "api_error");
    }
}
