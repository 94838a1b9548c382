//! Shared helpers for `restorekit-infra` integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use restorekit_domain::{RestoreKitError, RestoreSession, Result};
use restorekit_infra::{
    DispatchRequest, DispatchResponse, HttpClient, RequestExecutor, StaticTokenProvider,
    StorageApiClient,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::{MockServer, ResponseTemplate};

pub const DEVICE_GUID: &str = "4200";
pub const NODE_GUID: &str = "node-1";
pub const SESSION_ID: &str = "sess-1";
pub const TOKEN: &str = "test-token";

/// Storage client pointed at `server` with fast retries.
pub fn storage_client(server: &MockServer) -> StorageApiClient {
    storage_client_at(&server.uri(), Duration::from_secs(30))
}

/// Storage client for `base_url` whose requests time out after `timeout`.
pub fn storage_client_at(base_url: &str, timeout: Duration) -> StorageApiClient {
    let http = HttpClient::builder()
        .timeout(timeout)
        .max_attempts(2)
        .base_backoff(Duration::from_millis(1))
        .build()
        .expect("http client should build");
    StorageApiClient::new(http, base_url, Arc::new(StaticTokenProvider::new(TOKEN)))
        .expect("storage client should build")
}

/// One-shot HTTP server that answers the first request with `body`,
/// writing it a byte at a time with `gap` between bytes. Returns its base URL.
pub async fn slow_body_server(body: &'static [u8], gap: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else { return };
        let mut head = Vec::new();
        let mut buf = [0_u8; 1024];
        while !head.windows(4).any(|window| window == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => head.extend_from_slice(&buf[..n]),
            }
        }

        let headers = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/octet-stream\r\ncontent-length: {}\r\n\r\n",
            body.len()
        );
        if socket.write_all(headers.as_bytes()).await.is_err() {
            return;
        }
        for byte in body {
            tokio::time::sleep(gap).await;
            if socket.write_all(std::slice::from_ref(byte)).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
        }
    });

    format!("http://{addr}")
}

pub fn session() -> RestoreSession {
    RestoreSession {
        session_id: SESSION_ID.into(),
        device_guid: DEVICE_GUID.into(),
        node_guid: NODE_GUID.into(),
    }
}

/// 200 response wrapping `data` in the service's envelope.
pub fn envelope(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
}

pub fn node(id: &str, path: &str, kind: &str) -> Value {
    json!({ "id": id, "path": path, "type": kind })
}

/// What a scripted executor does with one request path
#[derive(Clone)]
pub enum Behaviour {
    Succeed,
    Fail(RestoreKitError),
    Panic(&'static str),
    Sleep(Duration),
}

/// Executor that records every path it runs, in execution order.
pub struct RecordingExecutor {
    executed: Mutex<Vec<String>>,
    behaviours: Mutex<Vec<(String, Behaviour)>>,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { executed: Mutex::new(Vec::new()), behaviours: Mutex::new(Vec::new()) })
    }

    pub fn on(self: &Arc<Self>, path: &str, behaviour: Behaviour) -> Arc<Self> {
        self.behaviours.lock().push((path.to_string(), behaviour));
        Arc::clone(self)
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    fn behaviour_for(&self, path: &str) -> Behaviour {
        self.behaviours
            .lock()
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, b)| b.clone())
            .unwrap_or(Behaviour::Succeed)
    }
}

#[async_trait]
impl RequestExecutor for RecordingExecutor {
    async fn execute(&self, request: &DispatchRequest) -> Result<DispatchResponse> {
        let behaviour = self.behaviour_for(&request.path);
        if let Behaviour::Sleep(duration) = &behaviour {
            tokio::time::sleep(*duration).await;
        }
        self.executed.lock().push(request.path.clone());
        match behaviour {
            Behaviour::Succeed | Behaviour::Sleep(_) => {
                Ok(DispatchResponse { status: 200, body: Bytes::from_static(b"{}") })
            }
            Behaviour::Fail(err) => Err(err),
            Behaviour::Panic(message) => panic!("{message}"),
        }
    }
}
