//! In-process dictionary server for integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::response::Builder;
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;

pub const DICTIONARY_PATH: &str = "/polyphone.txt";

/// A request as seen by the server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub if_modified_since: Option<String>,
    pub if_none_match: Option<String>,
    pub authorization: Option<String>,
}

struct ServerState {
    last_modified: Option<String>,
    etag: Option<String>,
    body: String,
    honor_conditionals: bool,
    head_status: Option<StatusCode>,
    get_status: Option<StatusCode>,
    truncate_get: bool,
    get_delay: Duration,
    requests: Vec<RecordedRequest>,
}

type Shared = Arc<Mutex<ServerState>>;

/// Serves one dictionary document over HTTP/1.1 on a loopback port.
///
/// Runs on its own thread and runtime so it works from both `#[test]` and
/// `#[tokio::test]`. Stops when dropped.
pub struct DictionaryServer {
    url: String,
    state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl DictionaryServer {
    pub fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(ServerState {
            last_modified: None,
            etag: None,
            body: String::new(),
            honor_conditionals: true,
            head_status: None,
            get_status: None,
            truncate_get: false,
            get_delay: Duration::ZERO,
            requests: Vec::new(),
        }));

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let url = format!("http://{}{}", listener.local_addr().unwrap(), DICTIONARY_PATH);

        let app = Router::new()
            .route(DICTIONARY_PATH, any(serve_dictionary))
            .with_state(Arc::clone(&state));
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app.into_make_service())
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .unwrap();
            });
        });

        Self {
            url,
            state,
            shutdown: Some(shutdown),
            thread: Some(thread),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Publish new content with the given validators.
    pub fn publish(&self, last_modified: Option<&str>, etag: Option<&str>, body: &str) {
        let mut state = self.state.lock();
        state.last_modified = last_modified.map(str::to_string);
        state.etag = etag.map(str::to_string);
        state.body = body.to_string();
    }

    /// Answer every HEAD with 200, like servers that ignore conditional headers.
    pub fn ignore_conditionals(&self) {
        self.state.lock().honor_conditionals = false;
    }

    pub fn fail_head(&self, status: StatusCode) {
        self.state.lock().head_status = Some(status);
    }

    pub fn fail_get(&self, status: StatusCode) {
        self.state.lock().get_status = Some(status);
    }

    /// Abort GET bodies after the first chunk.
    pub fn truncate_get(&self, truncate: bool) {
        self.state.lock().truncate_get = truncate;
    }

    pub fn delay_get(&self, delay: Duration) {
        self.state.lock().get_delay = delay;
    }

    /// Back to healthy responses.
    pub fn recover(&self) {
        let mut state = self.state.lock();
        state.head_status = None;
        state.get_status = None;
        state.truncate_get = false;
        state.get_delay = Duration::ZERO;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    pub fn count(&self, method: Method) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|request| request.method == method)
            .count()
    }
}

impl Drop for DictionaryServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

async fn serve_dictionary(
    State(state): State<Shared>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let request = RecordedRequest {
        method: method.clone(),
        if_modified_since: header_value(header::IF_MODIFIED_SINCE),
        if_none_match: header_value(header::IF_NONE_MATCH),
        authorization: header_value(header::AUTHORIZATION),
    };

    let (response, delay) = {
        let mut state = state.lock();
        let response = if method == Method::HEAD {
            head_response(&state, &request)
        } else {
            get_response(&state)
        };
        state.requests.push(request);
        (response, state.get_delay)
    };

    if method == Method::GET && !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    response
}

fn head_response(state: &ServerState, request: &RecordedRequest) -> Response {
    if let Some(status) = state.head_status {
        return status.into_response();
    }

    let hit = |sent: &Option<String>, current: &Option<String>| {
        matches!((sent, current), (Some(sent), Some(current)) if sent == current)
    };
    if state.honor_conditionals
        && (hit(&request.if_none_match, &state.etag)
            || hit(&request.if_modified_since, &state.last_modified))
    {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    with_validators(state, Builder::new().status(StatusCode::OK), Body::empty())
}

fn get_response(state: &ServerState) -> Response {
    if let Some(status) = state.get_status {
        return status.into_response();
    }

    let body = if state.truncate_get {
        let half = state.body.len() / 2;
        let head = state.body.as_bytes()[..half].to_vec();
        Body::from_stream(futures::stream::iter(vec![
            Ok::<Bytes, std::io::Error>(Bytes::from(head)),
            Err(std::io::Error::other("connection reset")),
        ]))
    } else {
        Body::from(state.body.clone())
    };

    with_validators(state, Builder::new().status(StatusCode::OK), body)
}

fn with_validators(state: &ServerState, mut builder: Builder, body: Body) -> Response {
    if let Some(last_modified) = &state.last_modified {
        builder = builder.header(header::LAST_MODIFIED, last_modified);
    }
    if let Some(etag) = &state.etag {
        builder = builder.header(header::ETAG, etag);
    }
    builder.body(body).unwrap()
}
