//! Exposes an in-process ledger gateway for use in integration tests.
//!
//! ```
//! use ledgerbench_test::gateway::TestGateway;
//!
//! #[tokio::main]
//! async fn main() {
//!    let gateway = TestGateway::new().await;
//!    let endpoint = gateway.url("/");
//!    // point an `HttpAdapter` at the endpoint...
//! }
//! ```

use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use ledgerbench_driver::{OperationRequest, SubmitResponse};

/// How the [`TestGateway`] answers submitted transactions.
#[derive(Clone, Debug, Default)]
pub enum Behavior {
    /// Accept every transaction and assign it an id.
    #[default]
    Accept,
    /// Reject every transaction with `400 Bad Request` and the given reason.
    Reject(String),
    /// Answer only after the given delay.
    Stall(Duration),
    /// Accept every transaction, answering `200 OK` with the given raw body.
    Respond(String),
}

#[derive(Debug)]
struct GatewayState {
    behavior: Behavior,
    received: Mutex<Vec<(String, OperationRequest)>>,
}

/// An in-process ledger gateway for use in integration tests.
///
/// The gateway serves `POST /channels/{channel}/transactions` and records every request. It
/// listens on a random available port on localhost.
#[derive(Debug)]
pub struct TestGateway {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    state: Arc<GatewayState>,
}

impl TestGateway {
    /// Starts a gateway that accepts every transaction.
    pub async fn new() -> Self {
        Self::with_behavior(Behavior::Accept).await
    }

    /// Starts a gateway with the given behavior.
    pub async fn with_behavior(behavior: Behavior) -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let state = Arc::new(GatewayState {
            behavior,
            received: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/channels/{channel}/transactions", post(submit))
            .with_state(Arc::clone(&state));

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            handle,
            socket,
            state,
        }
    }

    /// Returns a full URL pointing to the given path.
    ///
    /// This URL uses `localhost` as hostname.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("http://localhost:{}/{}", self.socket.port(), path)
    }

    /// Returns all received transactions with the channel they were submitted to.
    pub fn received(&self) -> Vec<(String, OperationRequest)> {
        self.state.received.lock().unwrap().clone()
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn submit(
    State(state): State<Arc<GatewayState>>,
    Path(channel): Path<String>,
    Json(request): Json<OperationRequest>,
) -> Response {
    let count = {
        let mut received = state.received.lock().unwrap();
        received.push((channel, request));
        received.len()
    };

    match &state.behavior {
        Behavior::Accept => Json(SubmitResponse {
            transaction_id: Some(format!("tx{count}")),
            result: None,
        })
        .into_response(),
        Behavior::Reject(reason) => (StatusCode::BAD_REQUEST, reason.clone()).into_response(),
        Behavior::Stall(delay) => {
            tokio::time::sleep(*delay).await;
            StatusCode::NO_CONTENT.into_response()
        }
        Behavior::Respond(body) => (StatusCode::OK, body.clone()).into_response(),
    }
}
