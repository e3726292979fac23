//! A scriptable in-memory target adapter.
//!
//! [`FakeAdapter`] records every submitted request and can be told to reject or fail specific
//! calls, delay submissions, or hold them until released. The adapter is [`Clone`] so tests can keep a
//! handle for inspection while the driver owns a shared copy.
//!
//! ```
//! use std::sync::Arc;
//!
//! use ledgerbench_driver::{RoundContext, TargetContext};
//! use ledgerbench_test::adapter::FakeAdapter;
//!
//! let adapter = FakeAdapter::new().fail_on(2);
//! let context = RoundContext::new(0, 1, 0)
//!     .adapter(Arc::new(adapter.clone()))
//!     .target_context(TargetContext::new());
//! ```

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ledgerbench_driver::{
    AdapterError, AdapterResult, OperationRequest, SubmitResponse, TargetAdapter,
};
use tokio::sync::Semaphore;

#[derive(Debug, Default)]
struct Script {
    requests: Vec<OperationRequest>,
    failures: BTreeSet<usize>,
    errors: BTreeSet<usize>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
}

/// An in-memory [`TargetAdapter`] for tests.
#[derive(Clone, Debug, Default)]
pub struct FakeAdapter {
    script: Arc<Mutex<Script>>,
}

impl FakeAdapter {
    /// Creates an adapter that accepts every submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the `call`-th submission, counting from one.
    pub fn fail_on(self, call: usize) -> Self {
        self.script.lock().unwrap().failures.insert(call);
        self
    }

    /// Fails the `call`-th submission with an adapter-internal error, counting from one.
    pub fn error_on(self, call: usize) -> Self {
        self.script.lock().unwrap().errors.insert(call);
        self
    }

    /// Delays every submission by `delay`.
    pub fn delay(self, delay: Duration) -> Self {
        self.script.lock().unwrap().delay = Some(delay);
        self
    }

    /// Holds every submission until [`release`](Self::release) is called.
    pub fn paused(self) -> Self {
        self.script.lock().unwrap().gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Lets all held and future submissions complete.
    pub fn release(&self) {
        if let Some(gate) = &self.script.lock().unwrap().gate {
            gate.close();
        }
    }

    /// Returns all requests received so far, in submission order.
    pub fn requests(&self) -> Vec<OperationRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    /// Returns the number of submissions received so far.
    pub fn submit_count(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }

    /// Waits until at least `count` submissions have been received.
    pub async fn wait_for_submits(&self, count: usize) {
        while self.submit_count() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

#[async_trait::async_trait]
impl TargetAdapter for FakeAdapter {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn submit(&self, request: OperationRequest) -> AdapterResult<SubmitResponse> {
        let (call, fail, error, delay, gate) = {
            let mut script = self.script.lock().unwrap();
            script.requests.push(request);
            let call = script.requests.len();
            (
                call,
                script.failures.contains(&call),
                script.errors.contains(&call),
                script.delay,
                script.gate.clone(),
            )
        };

        if let Some(gate) = gate {
            // Closing the semaphore wakes all waiters with an error, which is the release signal.
            gate.acquire().await.ok();
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if fail {
            return Err(AdapterError::Rejected {
                reason: format!("submission {call} rejected"),
            });
        }

        if error {
            return Err(AdapterError::Generic {
                context: format!("submission {call} lost"),
                cause: Box::new(std::io::Error::from(std::io::ErrorKind::ConnectionReset)),
            });
        }

        Ok(SubmitResponse {
            transaction_id: Some(format!("tx{call}")),
            result: None,
        })
    }
}
