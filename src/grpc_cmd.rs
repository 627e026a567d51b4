//! The `grpc` subcommand: a templated gRPC client for n8n workflows.
//!
//! This is intentionally a demonstration, not a functioning client. It opens
//! a tonic channel to the requested host:port to prove connectivity, then
//! emits a canned JSON response describing the call that generated stubs
//! would make. A real integration would:
//!
//! 1. compile its `.proto` files with `tonic-build`,
//! 2. create a stub over the channel (`YourServiceClient::new(channel)`),
//! 3. issue the typed request and serialize the typed response.
//!
//! Keeping the template free of generated code means it builds everywhere
//! without protoc and still exercises the transport layer end to end.

use anyhow::Result;
use serde_json::json;
use std::process::ExitCode;
use std::time::Duration;
use tonic::transport::{ClientTlsConfig, Endpoint};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Parameters for one demonstration call, from CLI flags with piped stdin
/// JSON overrides (n8n nodes pass parameters via stdin).
#[derive(Debug, Clone)]
pub struct GrpcCall {
    pub host: String,
    pub port: u16,
    pub service: String,
    pub method: String,
    pub data: serde_json::Value,
    pub tls: bool,
    pub timeout_secs: u64,
}

pub async fn run_grpc(mut call: GrpcCall) -> Result<ExitCode> {
    if !atty::is(atty::Stream::Stdin) {
        if let Ok(input) = std::io::read_to_string(std::io::stdin()) {
            if let Ok(overrides) = serde_json::from_str::<serde_json::Value>(&input) {
                apply_overrides(&mut call, &overrides);
            }
        }
    }

    match open_channel(&call).await {
        Ok(()) => {
            let result = json!({
                "status": "success",
                "service": call.service,
                "method": call.method,
                "host": call.host,
                "port": call.port,
                "request": call.data,
                "message": "gRPC call would be made here with generated stubs",
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let result = json!({
                "status": "error",
                "error": e.to_string(),
                "service": call.service,
                "method": call.method,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Open (and immediately drop) a channel to prove the endpoint is reachable.
async fn open_channel(call: &GrpcCall) -> Result<()> {
    let scheme = if call.tls { "https" } else { "http" };
    let uri = format!("{}://{}:{}", scheme, call.host, call.port);

    let mut endpoint = Endpoint::from_shared(uri)?
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(Duration::from_secs(call.timeout_secs));

    if call.tls {
        endpoint = endpoint.tls_config(ClientTlsConfig::new().with_native_roots())?;
    }

    let channel = endpoint.connect().await?;
    drop(channel);
    Ok(())
}

/// Merge stdin JSON fields over the flag values. Unknown keys are ignored;
/// `use_ssl` keeps the original script's field name.
fn apply_overrides(call: &mut GrpcCall, overrides: &serde_json::Value) {
    if let Some(host) = overrides.get("host").and_then(|v| v.as_str()) {
        call.host = host.to_string();
    }
    if let Some(port) = overrides.get("port").and_then(|v| v.as_u64()) {
        call.port = port as u16;
    }
    if let Some(service) = overrides.get("service").and_then(|v| v.as_str()) {
        call.service = service.to_string();
    }
    if let Some(method) = overrides.get("method").and_then(|v| v.as_str()) {
        call.method = method.to_string();
    }
    if let Some(data) = overrides.get("data") {
        call.data = data.clone();
    }
    if let Some(tls) = overrides.get("use_ssl").and_then(|v| v.as_bool()) {
        call.tls = tls;
    }
    if let Some(timeout) = overrides.get("timeout").and_then(|v| v.as_u64()) {
        call.timeout_secs = timeout;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_call() -> GrpcCall {
        GrpcCall {
            host: "localhost".to_string(),
            port: 50051,
            service: "ExampleService".to_string(),
            method: "GetData".to_string(),
            data: json!({}),
            tls: false,
            timeout_secs: 10,
        }
    }

    #[test]
    fn test_apply_overrides() {
        let mut call = base_call();
        apply_overrides(
            &mut call,
            &json!({
                "host": "grpc.internal",
                "port": 443,
                "service": "OrderService",
                "method": "Lookup",
                "data": {"order_id": 7},
                "use_ssl": true,
                "timeout": 30
            }),
        );

        assert_eq!(call.host, "grpc.internal");
        assert_eq!(call.port, 443);
        assert_eq!(call.service, "OrderService");
        assert_eq!(call.method, "Lookup");
        assert_eq!(call.data["order_id"], 7);
        assert!(call.tls);
        assert_eq!(call.timeout_secs, 30);
    }

    #[test]
    fn test_apply_overrides_partial() {
        let mut call = base_call();
        apply_overrides(&mut call, &json!({"method": "ListData"}));

        assert_eq!(call.method, "ListData");
        assert_eq!(call.host, "localhost");
        assert_eq!(call.port, 50051);
        assert!(!call.tls);
    }

    #[test]
    fn test_apply_overrides_ignores_wrong_types() {
        let mut call = base_call();
        apply_overrides(&mut call, &json!({"port": "not-a-number", "use_ssl": "yes"}));

        assert_eq!(call.port, 50051);
        assert!(!call.tls);
    }
}
