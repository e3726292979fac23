use thiserror::Error;

use crate::adapter::AdapterError;
use crate::driver::DriverState;

/// Errors that prevent a driver from entering a round.
///
/// These are fatal to the worker; the harness decides whether to abort the round.
#[derive(Debug, Error)]
pub enum InitializationError {
    /// The round context did not carry a target adapter.
    #[error("round context is missing the target adapter")]
    MissingAdapter,

    /// The round context did not carry a target context.
    #[error("round context is missing the target context")]
    MissingContext,

    /// The worker identity handed to setup is inconsistent.
    #[error("worker index {worker_index} is out of range for {total_workers} workers")]
    InvalidWorker {
        /// Index of the worker.
        worker_index: usize,
        /// Total number of workers in the round.
        total_workers: usize,
    },

    /// The driver was set up before, or has already been torn down.
    #[error("cannot set up a driver in state {state}")]
    InvalidState {
        /// State of the driver when setup was attempted.
        state: DriverState,
    },
}

/// Errors of a single operation.
///
/// Every failed operation is reported individually. Drivers never retry or suppress them.
#[derive(Debug, Error)]
pub enum OperationError {
    /// The operation was attempted before setup or after teardown.
    #[error("driver is not ready to perform operations (state: {state})")]
    NotReady {
        /// State of the driver when the operation was attempted.
        state: DriverState,
    },

    /// The target adapter failed to submit the request.
    #[error("operation {index} failed: {source}")]
    Submit {
        /// Invocation index of the failed operation.
        index: u64,
        /// The adapter's error.
        #[source]
        source: AdapterError,
    },
}

/// Residual issues encountered during teardown.
///
/// These are never escalated to fail a round. They are only reported to the driver's observer.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TeardownError {
    /// Teardown was called on a driver that is already closed.
    #[error("driver was already torn down")]
    AlreadyClosed,

    /// Operations were still awaiting the target when teardown released the adapter.
    #[error("{count} operations were still in flight")]
    OperationsInFlight {
        /// Number of in-flight operations.
        count: u64,
    },
}
