//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use edge_router::assets::MemoryAssetStore;
use edge_router::{EdgeConfig, HttpServer};

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decoded query parameters of the request target.
    pub fn query(&self) -> Vec<(String, String)> {
        let url = url::Url::parse(&format!("http://backend{}", self.target)).unwrap();
        url.query_pairs().into_owned().collect()
    }

    pub fn param(&self, name: &str) -> Option<String> {
        self.query()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<Recorded> {
    let mut reader = BufReader::new(socket);
    let mut line = String::new();
    reader.read_line(&mut line).await.ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            headers.push((k.trim().to_ascii_lowercase(), v.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).await.ok()?;

    Some(Recorded {
        method,
        target,
        headers,
        body,
    })
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        204 => "204 No Content",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Start a programmable backend that records every request it receives.
///
/// `f` produces the status, extra headers and body for each response.
pub async fn start_recording_backend<F, Fut>(f: F) -> (SocketAddr, mpsc::UnboundedReceiver<Recorded>)
where
    F: Fn(Recorded) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Vec<(&'static str, &'static str)>, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let _ = tx.send(request.clone());
                        let (status, headers, body) = f(request).await;

                        let mut response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                            status_text(status),
                            body.len()
                        );
                        for (k, v) in headers {
                            response.push_str(&format!("{k}: {v}\r\n"));
                        }
                        response.push_str("\r\n");
                        response.push_str(&body);

                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

/// Backend answering every request with a fixed status and body.
pub async fn start_mock_backend(status: u16, body: &'static str) -> (SocketAddr, mpsc::UnboundedReceiver<Recorded>) {
    start_recording_backend(move |_| async move { (status, Vec::new(), body.to_string()) }).await
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Wait for the next recorded request, failing the test after two seconds.
pub async fn next_request(rx: &mut mpsc::UnboundedReceiver<Recorded>) -> Recorded {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for backend request")
        .expect("backend channel closed")
}

/// Default config with the collector pointed at `collector`.
pub fn config_with_collector(collector: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.site.origin = Some("https://blog.example.com".into());
    config.analytics.collector_url = format!("http://{collector}/collect");
    config
}

/// Server over an in-memory site with a home page and a not-found page.
pub fn server(config: EdgeConfig) -> HttpServer {
    let store = MemoryAssetStore::new()
        .with("index.html", "<h1>Home</h1>")
        .with("css/main.css", "body{}")
        .with("404.html", "<h1>Not Found</h1>");
    HttpServer::with_store(config, Arc::new(store)).unwrap()
}
