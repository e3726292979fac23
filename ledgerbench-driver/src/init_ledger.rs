//! A workload driver that submits the same ledger initialization on every operation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::Instrument;

use crate::adapter::SharedAdapter;
use crate::config::{Config, Operation};
use crate::driver::{DriverState, RoundContext, WorkloadDriver};
use crate::error::{InitializationError, OperationError, TeardownError};
use crate::in_flight::{InFlight, InFlightGuard};
use crate::observer::{DriverEvent, SharedObserver, TracingObserver};
use crate::request::{OperationRequest, RoundArguments, TargetContext};

/// Submits a fixed contract invocation, `InitLedger` by default, on every operation.
///
/// The invocation counter advances once per operation and is reported to the observer, but it
/// does not influence the submitted request.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use ledgerbench_driver::{HttpAdapter, InitLedgerDriver, RoundContext, TargetContext, WorkloadDriver};
///
/// # async fn run() -> anyhow::Result<()> {
/// let driver = InitLedgerDriver::new();
/// let adapter = HttpAdapter::builder("http://localhost:8080").build()?;
///
/// let context = RoundContext::new(0, 1, 0)
///     .adapter(Arc::new(adapter))
///     .target_context(TargetContext::new());
/// driver.setup(context).await?;
///
/// driver.perform_operation().await?;
/// driver.teardown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct InitLedgerDriver {
    operation: Operation,
    observer: SharedObserver,
    inner: Mutex<Inner>,
    invocations: AtomicU64,
    in_flight: InFlight,
}

#[derive(Debug)]
struct Inner {
    state: DriverState,
    round: Option<Round>,
}

/// Everything held from setup until teardown.
#[derive(Debug)]
struct Round {
    adapter: SharedAdapter,
    target_context: Arc<TargetContext>,
    arguments: Arc<RoundArguments>,
    span: tracing::Span,
}

/// Admission of a single operation, taken while the driver is ready.
struct Ticket<'a> {
    index: u64,
    adapter: SharedAdapter,
    span: tracing::Span,
    in_flight: InFlightGuard<'a>,
}

impl InitLedgerDriver {
    /// Creates a driver that submits `InitLedger` to `testgo` as `Admin@example.com`.
    pub fn new() -> Self {
        Self::with_operation(Operation::default())
    }

    /// Creates a driver that submits the operation from the given configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::with_operation(config.operation.clone())
    }

    /// Creates a driver that submits the given operation.
    pub fn with_operation(operation: Operation) -> Self {
        Self {
            operation,
            observer: Arc::new(TracingObserver),
            inner: Mutex::new(Inner {
                state: DriverState::Uninitialized,
                round: None,
            }),
            invocations: AtomicU64::new(0),
            in_flight: InFlight::default(),
        }
    }

    /// Replaces the observer that receives lifecycle events.
    pub fn observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.lock().state
    }

    /// Returns the number of operations started since setup.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Returns the number of operations that are awaiting the target adapter.
    pub fn in_flight(&self) -> u64 {
        self.in_flight.count()
    }

    /// Waits until no operation is awaiting the target adapter.
    pub async fn wait_idle(&self) {
        self.in_flight.wait_idle().await
    }

    /// Returns the target context of the current round.
    pub fn target_context(&self) -> Option<Arc<TargetContext>> {
        let inner = self.lock();
        inner.round.as_ref().map(|r| Arc::clone(&r.target_context))
    }

    /// Returns the arguments of the current round.
    pub fn round_arguments(&self) -> Option<Arc<RoundArguments>> {
        let inner = self.lock();
        inner.round.as_ref().map(|r| Arc::clone(&r.arguments))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner is only updated by plain assignments and stays consistent after a panic.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_setup(
        &self,
        context: RoundContext,
        span: tracing::Span,
    ) -> Result<(), InitializationError> {
        let mut inner = self.lock();
        if inner.state != DriverState::Uninitialized {
            return Err(InitializationError::InvalidState { state: inner.state });
        }

        let RoundContext {
            worker_index,
            total_workers,
            round_arguments,
            adapter,
            target_context,
            ..
        } = context;

        if worker_index >= total_workers {
            return Err(InitializationError::InvalidWorker {
                worker_index,
                total_workers,
            });
        }
        let adapter = adapter.ok_or(InitializationError::MissingAdapter)?;
        let target_context = target_context.ok_or(InitializationError::MissingContext)?;

        self.invocations.store(0, Ordering::SeqCst);
        inner.round = Some(Round {
            adapter,
            target_context,
            arguments: Arc::new(round_arguments),
            span,
        });
        inner.state = DriverState::Ready;

        Ok(())
    }

    fn admit(&self) -> Result<Ticket<'_>, OperationError> {
        let inner = self.lock();
        let round = match (inner.state, &inner.round) {
            (DriverState::Ready, Some(round)) => round,
            (state, _) => return Err(OperationError::NotReady { state }),
        };

        Ok(Ticket {
            index: self.invocations.fetch_add(1, Ordering::SeqCst),
            adapter: Arc::clone(&round.adapter),
            span: round.span.clone(),
            in_flight: self.in_flight.track(),
        })
    }

    fn build_request(&self) -> OperationRequest {
        let Operation {
            target_id,
            operation_name,
            invoker_identity,
            arguments,
        } = &self.operation;

        OperationRequest::new(
            target_id.as_str(),
            operation_name.as_str(),
            invoker_identity.as_str(),
            arguments.clone(),
        )
    }

    /// Moves the driver out of the round and returns the residual issue, if any.
    fn close(&self) -> Option<TeardownError> {
        let round = {
            let mut inner = self.lock();
            match inner.state {
                DriverState::Uninitialized => {
                    inner.state = DriverState::Closed;
                    return None;
                }
                DriverState::Draining | DriverState::Closed => {
                    return Some(TeardownError::AlreadyClosed);
                }
                DriverState::Ready => {
                    inner.state = DriverState::Draining;
                    inner.round.take()
                }
            }
        };

        // In-flight operations keep their own handle to the adapter and finish on their own.
        drop(round);
        let count = self.in_flight.count();

        self.lock().state = DriverState::Closed;

        (count > 0).then_some(TeardownError::OperationsInFlight { count })
    }
}

impl Default for InitLedgerDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl WorkloadDriver for InitLedgerDriver {
    async fn setup(&self, context: RoundContext) -> Result<(), InitializationError> {
        let span = tracing::info_span!(
            "workload",
            worker = context.worker_index,
            round = context.round_index,
            adapter = context.adapter.as_ref().map(|adapter| adapter.name()),
        );

        span.clone().in_scope(|| {
            self.observer.on_event(&DriverEvent::SetupStarted {
                worker_index: context.worker_index,
                total_workers: context.total_workers,
                round_index: context.round_index,
            });

            let result = self.try_setup(context, span);
            self.observer.on_event(&DriverEvent::SetupFinished {
                result: result.as_ref().map(|_| ()),
            });

            result
        })
    }

    async fn perform_operation(&self) -> Result<(), OperationError> {
        // The guard lives until the operation completes or its future is dropped.
        let Ticket {
            index,
            adapter,
            span,
            in_flight: _in_flight,
        } = self.admit()?;

        async move {
            self.observer
                .on_event(&DriverEvent::OperationStarted { index });

            let request = self.build_request();
            let start = Instant::now();
            let result = adapter
                .submit(request)
                .await
                .map(|_response| ())
                .map_err(|source| OperationError::Submit { index, source });

            self.observer.on_event(&DriverEvent::OperationFinished {
                index,
                elapsed: start.elapsed(),
                result: result.as_ref().map(|_| ()),
            });

            result
        }
        .instrument(span)
        .await
    }

    async fn teardown(&self) {
        let span = self
            .lock()
            .round
            .as_ref()
            .map_or_else(tracing::Span::none, |round| round.span.clone());

        span.in_scope(|| {
            self.observer.on_event(&DriverEvent::TeardownStarted);

            let residual = self.close();
            self.observer.on_event(&DriverEvent::TeardownFinished {
                residual: residual.as_ref(),
            });
        });
    }
}
