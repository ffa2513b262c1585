//! # GDC Stub Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide a scriptable
//! in-process HTTP backend for integration testing the `gdc-core` SDK.
//! It is not intended for production use.
//!
//! Each route holds an ordered script of canned responses. A request pops
//! the next response from the script; the last response of a script keeps
//! repeating once reached, so a route can be scripted as "two 202s, then
//! 200 forever". Every handled request is recorded for later assertions
//! (method, path with query, body).

use std::collections::HashMap;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use parking_lot::Mutex;

/// A single canned HTTP response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Delay before responding. Used to hold a response open so concurrent
    /// requests overlap deterministically in tests.
    pub delay: Duration,
}

impl StubResponse {
    /// A response with the given status and an empty body.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: vec![],
            body: String::new(),
            delay: Duration::ZERO,
        }
    }

    /// A JSON response with the given status and raw body text.
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One request as seen by the stub, kept for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string, exactly as requested.
    pub path: String,
    /// Header names lowercased.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct StubState {
    scripts: Mutex<HashMap<String, VecDeque<StubResponse>>>,
    log: Mutex<Vec<RecordedRequest>>,
}

/// An in-process HTTP backend bound to an ephemeral localhost port.
#[derive(Debug, Clone)]
pub struct StubServer {
    addr: SocketAddr,
    state: Arc<StubState>,
}

/// Builder collecting route scripts before the server is spawned.
#[derive(Debug, Default)]
pub struct StubServerBuilder {
    scripts: HashMap<String, VecDeque<StubResponse>>,
}

impl StubServerBuilder {
    /// Script the responses served for `path` (matched without the query
    /// string), in order. The last response repeats once the script is
    /// exhausted.
    pub fn route(mut self, path: &str, responses: impl IntoIterator<Item = StubResponse>) -> Self {
        self.scripts
            .insert(path.to_string(), responses.into_iter().collect());
        self
    }

    pub async fn spawn(self) -> StubServer {
        let state = Arc::new(StubState {
            scripts: Mutex::new(self.scripts),
            log: Mutex::new(vec![]),
        });

        let router = Router::new()
            .fallback(handle_request)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        StubServer { addr, state }
    }
}

impl StubServer {
    pub fn builder() -> StubServerBuilder {
        StubServerBuilder::default()
    }

    /// Base URL of the running server, e.g. `http://127.0.0.1:49152`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// All requests handled so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.log.lock().clone()
    }

    /// Number of requests whose path (ignoring the query string) equals `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .log
            .lock()
            .iter()
            .filter(|r| r.path.split('?').next() == Some(path))
            .count()
    }
}

async fn handle_request(State(state): State<Arc<StubState>>, request: Request) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| path.clone());

    let headers = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    let body = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    state.log.lock().push(RecordedRequest {
        method,
        path: path_and_query,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let scripted = {
        let mut scripts = state.scripts.lock();
        match scripts.get_mut(&path) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        }
    };

    let Some(stub) = scripted else {
        return Response::builder()
            .status(404)
            .body(Body::empty())
            .unwrap();
    };

    if stub.delay > Duration::ZERO {
        tokio::time::sleep(stub.delay).await;
    }

    let mut builder = Response::builder().status(stub.status);
    for (name, value) in &stub.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.body(Body::from(stub.body)).unwrap()
}
