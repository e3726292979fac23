//! Observability hook for workload drivers.
//!
//! Drivers do not log progress on their own. Instead, they report a [`DriverEvent`] to an
//! injected [`DriverObserver`] at defined points of their lifecycle. The default observer,
//! [`TracingObserver`], turns these events into `tracing` events.

use std::error::Error;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{InitializationError, OperationError, TeardownError};

/// A shared, type-erased [`DriverObserver`] instance.
pub type SharedObserver = Arc<dyn DriverObserver>;

/// A point in the lifecycle of a driver.
#[derive(Clone, Copy, Debug)]
pub enum DriverEvent<'a> {
    /// Setup was called.
    SetupStarted {
        /// Index of the worker.
        worker_index: usize,
        /// Total number of workers in the round.
        total_workers: usize,
        /// Index of the round.
        round_index: usize,
    },
    /// Setup completed.
    SetupFinished {
        /// Whether the driver entered the round.
        result: Result<(), &'a InitializationError>,
    },
    /// An operation took its invocation index and is about to submit.
    OperationStarted {
        /// Invocation index of the operation.
        index: u64,
    },
    /// The target adapter returned for an operation.
    OperationFinished {
        /// Invocation index of the operation.
        index: u64,
        /// Time spent in the target adapter.
        elapsed: Duration,
        /// Outcome of the submission.
        result: Result<(), &'a OperationError>,
    },
    /// Teardown was called.
    TeardownStarted,
    /// Teardown completed.
    TeardownFinished {
        /// Non-fatal issue encountered during teardown.
        residual: Option<&'a TeardownError>,
    },
}

/// Receives [`DriverEvent`]s from a driver.
///
/// Observers are invoked synchronously from within the driver and must not block.
pub trait DriverObserver: Debug + Send + Sync {
    /// Called for every lifecycle event of the driver.
    fn on_event(&self, event: &DriverEvent<'_>);
}

/// Reports driver events as `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl DriverObserver for TracingObserver {
    fn on_event(&self, event: &DriverEvent<'_>) {
        match *event {
            DriverEvent::SetupStarted {
                worker_index,
                total_workers,
                round_index,
            } => {
                tracing::info!(
                    worker_index,
                    total_workers,
                    round_index,
                    "initializing workload driver"
                );
            }
            DriverEvent::SetupFinished { result: Ok(()) } => {
                tracing::info!("workload driver ready");
            }
            DriverEvent::SetupFinished { result: Err(error) } => {
                tracing::error!(
                    error = error as &dyn Error,
                    "workload driver failed to initialize"
                );
            }
            DriverEvent::OperationStarted { index } => {
                tracing::debug!(index, "running workload operation");
            }
            DriverEvent::OperationFinished {
                index,
                elapsed,
                result: Ok(()),
            } => {
                tracing::debug!(index, ?elapsed, "workload operation submitted");
            }
            DriverEvent::OperationFinished {
                index,
                elapsed,
                result: Err(error),
            } => {
                tracing::warn!(
                    index,
                    ?elapsed,
                    error = error as &dyn Error,
                    "workload operation failed"
                );
            }
            DriverEvent::TeardownStarted => {
                tracing::info!("cleaning up workload driver");
            }
            DriverEvent::TeardownFinished { residual: None } => {
                tracing::info!("workload driver closed");
            }
            DriverEvent::TeardownFinished {
                residual: Some(residual),
            } => {
                tracing::warn!(
                    error = residual as &dyn Error,
                    "workload driver closed with residual issues"
                );
            }
        }
    }
}
