//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use feed_aggregator::{FeedConfig, HttpServer, Shutdown};

/// The parts of an inbound request the mock upstreams care about.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub path: String,
    pub authorization: Option<String>,
}

/// Start a programmable mock upstream on an ephemeral port.
///
/// The handler receives the parsed request and returns (status, JSON body).
pub async fn start_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 1024];
                        // Read until end of headers; GET requests carry no body.
                        loop {
                            match socket.read(&mut chunk).await {
                                Ok(0) => break,
                                Ok(n) => {
                                    buf.extend_from_slice(&chunk[..n]);
                                    if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                                        break;
                                    }
                                }
                                Err(_) => return,
                            }
                        }

                        let request = parse_request(&buf);
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

fn parse_request(raw: &[u8]) -> MockRequest {
    let text = String::from_utf8_lossy(raw);
    let path = text
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let authorization = text.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.eq_ignore_ascii_case("authorization") {
            Some(value.trim().to_string())
        } else {
            None
        }
    });
    MockRequest {
        path,
        authorization,
    }
}

/// A config pointed at the given mock upstreams, hardened for test speed.
#[allow(dead_code)]
pub fn test_config(directory: SocketAddr, posts: SocketAddr) -> FeedConfig {
    let mut config = FeedConfig::default();
    config.upstreams.directory_url = format!("http://{}", directory);
    config.upstreams.posts_url = format!("http://{}", posts);
    config.upstreams.request_timeout_ms = 2_000;
    config.observability.metrics_enabled = false;
    config
}

/// Spawn the service on an ephemeral port; the returned coordinator keeps
/// it alive until dropped or triggered.
#[allow(dead_code)]
pub async fn start_service(config: FeedConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = HttpServer::new(&config);

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// Canned directory payload: a single user alice/Alice A with id 1.
#[allow(dead_code)]
pub const ALICE_USERS_JSON: &str = r#"[{"id":1,"userName":"alice","profileName":"Alice A"}]"#;

/// Canned single-user payload for `/users/name/alice`.
#[allow(dead_code)]
pub const ALICE_USER_JSON: &str = r#"{"id":1,"userName":"alice","profileName":"Alice A"}"#;
