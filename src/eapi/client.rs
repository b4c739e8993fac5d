use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{CONNECTION, CONTENT_TYPE, HOST};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::net::UnixStream;
use tokio::runtime::Runtime;
use tracing::debug;

use super::{CommandApi, EapiError, decode_response, encode_request};

const ENDPOINT: &str = "/command-api";

/// JSON-RPC client for the command API on a local Unix socket.
///
/// Calls block on a private current-thread runtime. Each call opens its own
/// HTTP/1.1 connection and closes it before returning.
#[derive(Debug)]
pub struct EapiClient {
    path: PathBuf,
    rt: Runtime,
    next_id: u64,
}

impl EapiClient {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, EapiError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()?;
        Ok(Self {
            path: path.into(),
            rt,
            next_id: 1,
        })
    }
}

async fn post(path: &Path, body: Vec<u8>) -> Result<(u16, Bytes), EapiError> {
    let stream = UnixStream::connect(path)
        .await
        .map_err(|source| EapiError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
    let driver = tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "command API connection ended with error");
        }
    });

    let req = Request::builder()
        .method(Method::POST)
        .uri(ENDPOINT)
        .header(HOST, "localhost")
        .header(CONTENT_TYPE, "application/json")
        .header(CONNECTION, "close")
        .body(Full::new(Bytes::from(body)))?;
    let resp = sender.send_request(req).await?;
    let status = resp.status().as_u16();
    let body = resp.into_body().collect().await?.to_bytes();

    drop(sender);
    let _ = driver.await;
    Ok((status, body))
}

impl CommandApi for EapiClient {
    fn run_cmds(&mut self, cmds: &[String]) -> Result<Vec<Value>, EapiError> {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, ?cmds, socket = %self.path.display(), "runCmds");

        let body = encode_request(id, cmds)?;
        let (status, body) = self.rt.block_on(post(&self.path, body))?;
        debug!(id, status, bytes = body.len(), "response");

        // JSON-RPC errors may ride on a non-2xx status; prefer the JSON body when there is one.
        match decode_response(&body, cmds.len()) {
            Err(EapiError::Json(_)) if !(200..300).contains(&status) => Err(EapiError::Http(status)),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::os::unix::net::UnixListener;
    use std::thread;

    /// Serves one canned HTTP response per accepted connection and returns
    /// the request line and body it saw on each.
    fn serve(
        listener: UnixListener,
        responses: Vec<String>,
    ) -> thread::JoinHandle<Vec<(String, String)>> {
        thread::spawn(move || {
            let mut seen = Vec::new();
            for resp in responses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream);
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut len = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if line == "\r\n" {
                        break;
                    }
                    if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                        len = v.trim().parse().unwrap();
                    }
                }
                let mut body = vec![0u8; len];
                reader.read_exact(&mut body).unwrap();
                seen.push((request_line.trim_end().to_string(), String::from_utf8(body).unwrap()));
                reader.get_mut().write_all(resp.as_bytes()).unwrap();
            }
            seen
        })
    }

    fn http_ok(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[test]
    fn run_cmds_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("command-api.sock");
        let listener = UnixListener::bind(&sock).unwrap();
        let server = serve(
            listener,
            vec![
                http_ok(r#"{"jsonrpc":"2.0","id":"1","result":[{"messages":["ok"]}]}"#),
                http_ok(r#"{"jsonrpc":"2.0","id":"2","result":[{},{}]}"#),
            ],
        );

        let mut client = EapiClient::new(&sock).unwrap();
        let first = client.run_cmds(&["show version".to_string()]).unwrap();
        assert_eq!(first[0]["messages"][0], "ok");
        let second = client
            .run_cmds(&["enable".to_string(), "configure".to_string()])
            .unwrap();
        assert_eq!(second.len(), 2);

        let seen = server.join().unwrap();
        assert_eq!(seen[0].0, "POST /command-api HTTP/1.1");
        let a: Value = serde_json::from_str(&seen[0].1).unwrap();
        let b: Value = serde_json::from_str(&seen[1].1).unwrap();
        assert_eq!(a["id"], "1");
        assert_eq!(b["id"], "2");
        assert_eq!(b["params"]["cmds"][1], "configure");
    }

    #[test]
    fn chunked_response() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("api.sock");
        let listener = UnixListener::bind(&sock).unwrap();
        let json = r#"{"jsonrpc":"2.0","id":"1","result":[{}]}"#;
        let (head, tail) = json.split_at(10);
        let resp = format!(
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n{:x}\r\n{}\r\n{:x}\r\n{}\r\n0\r\n\r\n",
            head.len(),
            head,
            tail.len(),
            tail
        );
        let server = serve(listener, vec![resp]);

        let mut client = EapiClient::new(&sock).unwrap();
        let out = client.run_cmds(&["enable".to_string()]).unwrap();
        assert_eq!(out, vec![serde_json::json!({})]);
        server.join().unwrap();
    }

    #[test]
    fn non_json_error_status() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("api.sock");
        let listener = UnixListener::bind(&sock).unwrap();
        let server = serve(
            listener,
            vec!["HTTP/1.1 502 Bad Gateway\r\nContent-Length: 3\r\n\r\nbad".to_string()],
        );

        let mut client = EapiClient::new(&sock).unwrap();
        let err = client.run_cmds(&["show clock".to_string()]).unwrap_err();
        assert!(matches!(err, EapiError::Http(502)));
        server.join().unwrap();
    }

    #[test]
    fn missing_socket() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = EapiClient::new(dir.path().join("nope.sock")).unwrap();
        let err = client.run_cmds(&["enable".to_string()]).unwrap_err();
        assert!(matches!(err, EapiError::Connect { .. }));
        assert!(err.to_string().contains("nope.sock"));
    }
}
