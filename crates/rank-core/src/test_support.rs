//! In-process HTTP server serving canned responses to the tests

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What the server answers for one ticker
#[derive(Debug, Clone)]
pub enum Reply {
    Page { status: u16, body: String },
    /// Accept the connection and never answer
    Hang,
}

impl Reply {
    pub fn page(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Reply::Page {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Default)]
struct Seen {
    user_agents: Vec<String>,
    targets: Vec<String>,
    hits: HashMap<String, usize>,
}

pub struct TestServer {
    addr: SocketAddr,
    seen: Arc<Mutex<Seen>>,
}

impl TestServer {
    /// Serve `/stock/quote/{ticker}` for each route; unknown tickers get a 404
    pub async fn start(routes: Vec<(&str, Reply)>) -> Self {
        Self::serve(
            routes
                .into_iter()
                .map(|(ticker, reply)| (format!("/stock/quote/{ticker}"), reply))
                .collect(),
        )
        .await
    }

    /// Serve arbitrary paths; the query string is ignored when matching
    pub async fn serve(routes: Vec<(String, Reply)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Arc<HashMap<String, Reply>> = Arc::new(routes.into_iter().collect());
        let seen = Arc::new(Mutex::new(Seen::default()));

        let task_seen = Arc::clone(&seen);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let seen = Arc::clone(&task_seen);
                tokio::spawn(handle(socket, routes, seen));
            }
        });

        Self { addr, seen }
    }

    pub fn rank_template(&self) -> String {
        format!("http://{}/stock/quote/{{ticker}}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Request targets in arrival order, query strings included
    pub fn targets(&self) -> Vec<String> {
        self.seen.lock().unwrap().targets.clone()
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.seen.lock().unwrap().user_agents.clone()
    }

    pub fn hits(&self, ticker: &str) -> usize {
        self.path_hits(&format!("/stock/quote/{ticker}"))
    }

    pub fn path_hits(&self, path: &str) -> usize {
        self.seen.lock().unwrap().hits.get(path).copied().unwrap_or(0)
    }
}

async fn handle(mut socket: TcpStream, routes: Arc<HashMap<String, Reply>>, seen: Arc<Mutex<Seen>>) {
    let mut buf = vec![0_u8; 8192];
    let mut read = 0;
    while read < buf.len() {
        let Ok(n) = socket.read(&mut buf[read..]).await else {
            return;
        };
        if n == 0 {
            break;
        }
        read += n;
        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let request = String::from_utf8_lossy(&buf[..read]).to_string();
    let target = request.split_whitespace().nth(1).unwrap_or("/").to_string();
    let path = target.split('?').next().unwrap_or("/").to_string();
    let user_agent = request
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("user-agent")
                .then(|| value.trim().to_string())
        })
        .unwrap_or_default();

    {
        let mut seen = seen.lock().unwrap();
        seen.user_agents.push(user_agent);
        seen.targets.push(target);
        *seen.hits.entry(path.clone()).or_default() += 1;
    }

    let (status, body) = match routes.get(&path) {
        Some(Reply::Page { status, body }) => (*status, body.clone()),
        Some(Reply::Hang) => {
            tokio::time::sleep(Duration::from_secs(60)).await;
            return;
        },
        None => (404, "not found".to_string()),
    };

    let response = format!(
        "HTTP/1.1 {status} Test\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}
