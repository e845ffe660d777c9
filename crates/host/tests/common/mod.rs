//! In-process HTTP stub for client integration tests

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

type Responder = Arc<dyn Fn(&Value) -> (StatusCode, Value) + Send + Sync>;

#[derive(Clone)]
struct Stub {
    responder: Responder,
    requests: Arc<Mutex<Vec<Value>>>,
}

pub struct StubServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Value>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl StubServer {
    /// Serve `POST /` on an ephemeral port, answering every JSON body with `responder`
    pub async fn start(responder: impl Fn(&Value) -> (StatusCode, Value) + Send + Sync + 'static) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let stub = Stub { responder: Arc::new(responder), requests: Arc::clone(&requests) };
        let app = Router::new().route("/", post(handle)).with_state(stub);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub listener");
        let addr = listener.local_addr().expect("listener local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });

        Self { url: format!("http://{addr}/"), requests, handle }
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle(State(stub): State<Stub>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    stub.requests.lock().unwrap().push(body.clone());
    let (status, reply) = (stub.responder)(&body);
    (status, Json(reply))
}
