//! Command API (eAPI) access.
//!
//! Both the probe and the config updater talk to the device through
//! [`CommandApi`]; [`client::EapiClient`] is the real implementation over
//! the local Unix socket.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

pub mod client;

pub use client::EapiClient;

#[derive(Debug, Error)]
pub enum EapiError {
    #[error("connect {}: {source}", .path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("socket i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("http: {0}")]
    Hyper(#[from] hyper::Error),
    #[error("building request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("http status {0}")]
    Http(u16),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("command API error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        /// Per-command results up to and including the failing command.
        data: Vec<Value>,
    },
    #[error("expected {expected} command results, got {got}")]
    ResultCount { expected: usize, got: usize },
}

/// Anything that can execute an ordered list of CLI commands and return one
/// result per command.
pub trait CommandApi {
    fn run_cmds(&mut self, cmds: &[String]) -> Result<Vec<Value>, EapiError>;
}

/// A command that completed with nothing to report.
pub fn is_empty_result(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        _ => false,
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RunCmdsParams<'a>,
    id: String,
}

#[derive(Debug, Serialize)]
struct RunCmdsParams<'a> {
    version: u32,
    cmds: &'a [String],
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Vec<Value>,
}

fn encode_request(id: u64, cmds: &[String]) -> Result<Vec<u8>, EapiError> {
    let req = RpcRequest {
        jsonrpc: "2.0",
        method: "runCmds",
        params: RunCmdsParams {
            version: 1,
            cmds,
            format: "json",
        },
        id: id.to_string(),
    };
    Ok(serde_json::to_vec(&req)?)
}

fn decode_response(body: &[u8], expected: usize) -> Result<Vec<Value>, EapiError> {
    let resp: RpcResponse = serde_json::from_slice(body)?;
    if let Some(err) = resp.error {
        return Err(EapiError::Rpc {
            code: err.code,
            message: err.message,
            data: err.data,
        });
    }
    let result = resp
        .result
        .ok_or_else(|| EapiError::MalformedResponse("neither result nor error".into()))?;
    if result.len() != expected {
        return Err(EapiError::ResultCount {
            expected,
            got: result.len(),
        });
    }
    Ok(result)
}
