//! The lifecycle contract between a load-generation harness and a workload driver.
//!
//! A harness creates one driver per worker and moves it through exactly one round:
//!
//! 1. [`setup`](WorkloadDriver::setup) once, with the [`RoundContext`] of the worker,
//! 2. [`perform_operation`](WorkloadDriver::perform_operation) as many times as the round asks for,
//! 3. [`teardown`](WorkloadDriver::teardown) once, even if operations failed.
//!
//! The corresponding states are described by [`DriverState`].

use std::fmt;
use std::sync::Arc;

use crate::adapter::SharedAdapter;
use crate::error::{InitializationError, OperationError};
use crate::request::{RoundArguments, TargetContext};

/// A type-erased [`WorkloadDriver`] instance.
pub type BoxedDriver = Box<dyn WorkloadDriver>;

/// A workload that a harness drives through one round.
///
/// Drivers of independent workers share no state. Within one driver, the harness never calls
/// lifecycle methods concurrently, but it may start another operation while a previous
/// submission is still awaiting the target.
#[async_trait::async_trait]
pub trait WorkloadDriver: fmt::Debug + Send + Sync {
    /// Prepares the driver for a round.
    ///
    /// Stores the adapter and context of the round and resets the invocation counter. This
    /// performs no network I/O.
    async fn setup(&self, context: RoundContext) -> Result<(), InitializationError>;

    /// Builds and submits one request to the target adapter.
    ///
    /// Only legal after a successful setup and before teardown.
    async fn perform_operation(&self) -> Result<(), OperationError>;

    /// Releases everything held for the round.
    ///
    /// This never fails. Residual issues are reported to the observer of the driver.
    async fn teardown(&self);
}

/// Lifecycle state of a [`WorkloadDriver`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DriverState {
    /// Created, but not yet set up.
    Uninitialized,
    /// Set up and accepting operations.
    Ready,
    /// Teardown has begun.
    Draining,
    /// Torn down.
    Closed,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Everything a harness hands to a driver at setup.
///
/// The target adapter and the target context are required. Setup fails if either is missing.
#[derive(Clone, Debug)]
pub struct RoundContext {
    /// Zero-based index of the worker running the driver.
    pub worker_index: usize,
    /// Total number of workers in the round.
    pub total_workers: usize,
    /// Zero-based index of the round.
    pub round_index: usize,
    /// Arguments of the round from the benchmark definition.
    pub round_arguments: RoundArguments,
    /// Adapter to submit requests through.
    pub adapter: Option<SharedAdapter>,
    /// Target-specific context of the worker.
    pub target_context: Option<Arc<TargetContext>>,
}

impl RoundContext {
    /// Creates a context for the given worker and round, without adapter or target context.
    pub fn new(worker_index: usize, total_workers: usize, round_index: usize) -> Self {
        Self {
            worker_index,
            total_workers,
            round_index,
            round_arguments: RoundArguments::new(),
            adapter: None,
            target_context: None,
        }
    }

    /// Sets the round arguments.
    pub fn round_arguments(mut self, arguments: RoundArguments) -> Self {
        self.round_arguments = arguments;
        self
    }

    /// Sets the target adapter.
    pub fn adapter(mut self, adapter: SharedAdapter) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Sets the target context.
    pub fn target_context(mut self, context: impl Into<Arc<TargetContext>>) -> Self {
        self.target_context = Some(context.into());
        self
    }
}
