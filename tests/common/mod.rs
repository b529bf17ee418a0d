//! Test utilities and common setup.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::Request;
use axum::http::{HeaderMap, StatusCode, header};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use inquest::agent::{AgentService, EventResult, EventRx, Investigator};
use inquest::api;
use inquest::customers::CustomerStore;
use inquest::proxy::{ProxyState, RouteTable, create_gateway_router};
use inquest::regulations::RegulationStore;

/// Investigator that replays a fixed script of producer items.
///
/// Each instance serves one run: the script is drained on the first call.
pub struct ScriptedInvestigator {
    script: Mutex<Vec<EventResult>>,
    runs: Arc<AtomicUsize>,
}

impl ScriptedInvestigator {
    pub fn new(script: Vec<EventResult>) -> Self {
        Self {
            script: Mutex::new(script),
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared run counter; stays readable after the app consumes `self`.
    pub fn run_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.runs)
    }
}

impl Investigator for ScriptedInvestigator {
    fn investigate(&self, _query: String) -> EventRx {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let script = std::mem::take(&mut *self.script.lock().unwrap());
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for item in script {
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        rx
    }
}

/// Agent app running the production investigation pipeline.
pub fn agent_app() -> Router {
    let customers = Arc::new(CustomerStore::with_mock_data());
    let regulations = Arc::new(RegulationStore::empty(Duration::from_secs(1)));
    let service = AgentService::new(Arc::clone(&customers), regulations);
    let state = api::AppState::new(service, customers);
    api::create_router(state, &["*".to_string()])
}

/// Agent app whose investigator replays `script`. Returns the app and the
/// run counter so tests can assert whether the producer ever started.
pub fn scripted_app(script: Vec<EventResult>) -> (Router, Arc<AtomicUsize>) {
    let investigator = ScriptedInvestigator::new(script);
    let runs = investigator.run_counter();
    let customers = Arc::new(CustomerStore::with_mock_data());
    let state = api::AppState::new(investigator, customers);
    (api::create_router(state, &["*".to_string()]), runs)
}

/// Gateway app routing to the given backend base URLs.
pub fn gateway_app(default_url: &str, investigation_url: &str) -> Router {
    let routes = RouteTable::new(default_url, investigation_url);
    let state = ProxyState::new(routes);
    create_gateway_router(state, &["http://localhost:5173".to_string()])
}

/// Request capture from a stub backend.
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Stub HTTP backend listening on an ephemeral local port.
pub struct StubBackend {
    pub url: String,
    seen: Arc<Mutex<Option<SeenRequest>>>,
}

impl StubBackend {
    /// The last request this backend served, if any.
    pub fn seen(&self) -> Option<SeenRequest> {
        self.seen.lock().unwrap().take()
    }
}

/// Spawn a stub backend answering every request with `status` and `body`.
pub async fn spawn_stub_backend(status: StatusCode, body: &'static str) -> StubBackend {
    let seen: Arc<Mutex<Option<SeenRequest>>> = Arc::new(Mutex::new(None));
    let capture = Arc::clone(&seen);

    let app = Router::new().fallback(move |req: Request| {
        let capture = Arc::clone(&capture);
        async move {
            let (parts, req_body) = req.into_parts();
            let bytes = axum::body::to_bytes(req_body, usize::MAX)
                .await
                .unwrap_or_default();
            *capture.lock().unwrap() = Some(SeenRequest {
                method: parts.method.to_string(),
                path: parts.uri.path().to_string(),
                query: parts.uri.query().map(str::to_string),
                headers: parts.headers,
                body: bytes.to_vec(),
            });
            (status, [(header::CONTENT_TYPE, "application/json")], body)
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubBackend {
        url: format!("http://{addr}"),
        seen,
    }
}
