// Shared HTTP seam + provider adapters

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{ScanError, ScanResult};

/// A single read-only GET against an upstream API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into(), query: Vec::new(), headers: Vec::new() }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }
}

/// Anything that can turn an `ApiRequest` into a JSON document.
/// Adapters only talk to upstreams through this trait.
#[async_trait::async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn get_json(&self, request: &ApiRequest) -> ScanResult<Value>;
}

/// `JsonFetcher` over reqwest: one attempt, bounded timeout, no retries.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> ScanResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("market-scanner/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl JsonFetcher for HttpFetcher {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn get_json(&self, request: &ApiRequest) -> ScanResult<Value> {
        let mut builder = self.client.get(&request.url).query(&request.query);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Upstream returned non-success status");
            return Err(ScanError::Status { url: request.url.clone(), status: status.as_u16() });
        }

        let body = response.bytes().await?;
        debug!(bytes = body.len(), "Received upstream payload");
        Ok(serde_json::from_slice(&body)?)
    }
}

pub mod binance;
pub mod binance_types;
pub mod coinmarketcap;
pub mod coinmarketcap_types;

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory fetcher used by adapter and pipeline tests.

    use std::sync::Mutex;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    /// Answer one HTTP request on a local port with `status` and `body`.
    /// Returns the base URL to point a client at.
    pub async fn serve_once(status: u16, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    /// Read headers plus `content-length` bytes of body.
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else { continue };
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
    }

    /// Responds to a request whose URL ends with a registered suffix.
    /// Unregistered URLs answer with HTTP 404.
    #[derive(Default)]
    pub struct ScriptedFetcher {
        routes: Vec<(String, Route)>,
        pub seen: Mutex<Vec<ApiRequest>>,
    }

    enum Route {
        Json(Value),
        Status(u16),
        /// Match on a query parameter value as well as the path.
        ByQuery(String, Vec<(String, Value)>),
    }

    impl ScriptedFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ok(mut self, path_suffix: &str, body: Value) -> Self {
            self.routes.push((path_suffix.to_string(), Route::Json(body)));
            self
        }

        pub fn status(mut self, path_suffix: &str, status: u16) -> Self {
            self.routes.push((path_suffix.to_string(), Route::Status(status)));
            self
        }

        pub fn by_query(mut self, path_suffix: &str, key: &str, bodies: Vec<(&str, Value)>) -> Self {
            let bodies = bodies.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
            self.routes.push((path_suffix.to_string(), Route::ByQuery(key.to_string(), bodies)));
            self
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
        }
    }

    #[async_trait::async_trait]
    impl JsonFetcher for ScriptedFetcher {
        async fn get_json(&self, request: &ApiRequest) -> ScanResult<Value> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.clone());
            }
            let not_found = || ScanError::Status { url: request.url.clone(), status: 404 };

            let route = self
                .routes
                .iter()
                .find(|(suffix, _)| request.url.ends_with(suffix.as_str()))
                .map(|(_, route)| route)
                .ok_or_else(not_found)?;

            match route {
                Route::Json(body) => Ok(body.clone()),
                Route::Status(status) => Err(ScanError::Status { url: request.url.clone(), status: *status }),
                Route::ByQuery(key, bodies) => {
                    let value = request
                        .query
                        .iter()
                        .find(|(k, _)| k == key)
                        .map(|(_, v)| v.as_str())
                        .ok_or_else(not_found)?;
                    bodies
                        .iter()
                        .find(|(k, _)| k == value)
                        .map(|(_, body)| body.clone())
                        .ok_or_else(not_found)
                }
            }
        }
    }
}
