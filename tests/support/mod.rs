//! Minimal HTTP/1.1 stand-in for the strategy service.
//!
//! Answers canned bodies per `METHOD /path` and records every request so
//! tests can check what went over the wire. One request per connection.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

#[derive(Debug, Clone)]
struct Canned {
    status: u16,
    content_type: &'static str,
    body: String,
}

#[derive(Clone, Default)]
pub struct MockService {
    routes: Arc<Mutex<HashMap<String, Canned>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_json(&self, route: &str, status: u16, body: &str) -> &Self {
        self.respond(route, status, "application/json", body)
    }

    pub fn respond(&self, route: &str, status: u16, content_type: &'static str, body: &str) -> &Self {
        self.routes.lock().unwrap().insert(
            route.to_string(),
            Canned {
                status,
                content_type,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Binds an ephemeral port and serves until the runtime shuts down.
    pub async fn start(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let svc = self.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { break };
                let svc = svc.clone();
                tokio::spawn(async move { svc.serve(stream).await });
            }
        });
        addr
    }

    async fn serve(&self, mut stream: TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos + 4;
            }
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.split("\r\n");
        let request_line = lines.next().unwrap_or_default();
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or_default().to_string();
        let headers: HashMap<String, String> = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();

        let content_len: usize = headers.get("content-length").and_then(|v| v.parse().ok()).unwrap_or(0);
        while buf.len() < header_end + content_len {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }
        let body_end = (header_end + content_len).min(buf.len());
        let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

        let route = format!("{} {}", method, path);
        self.requests.lock().unwrap().push(Recorded {
            method,
            path,
            headers,
            body,
        });

        let canned = self.routes.lock().unwrap().get(&route).cloned().unwrap_or(Canned {
            status: 404,
            content_type: "application/json",
            body: r#"{"detail":"Not Found"}"#.to_string(),
        });
        let response = format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            canned.status,
            if canned.status < 400 { "OK" } else { "ERROR" },
            canned.content_type,
            canned.body.len(),
            canned.body
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// A base URL nothing is listening on.
pub fn dead_base() -> String {
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    format!("http://127.0.0.1:{}", port)
}
