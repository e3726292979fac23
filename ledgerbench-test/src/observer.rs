//! An observer that records driver events for later assertions.

use std::sync::{Arc, Mutex};

use ledgerbench_driver::{DriverEvent, DriverObserver, TeardownError};

/// An owned copy of a [`DriverEvent`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecordedEvent {
    /// See [`DriverEvent::SetupStarted`].
    SetupStarted {
        /// Index of the worker.
        worker_index: usize,
        /// Total number of workers.
        total_workers: usize,
        /// Index of the round.
        round_index: usize,
    },
    /// See [`DriverEvent::SetupFinished`].
    SetupFinished {
        /// Whether setup succeeded.
        ok: bool,
    },
    /// See [`DriverEvent::OperationStarted`].
    OperationStarted {
        /// Invocation index.
        index: u64,
    },
    /// See [`DriverEvent::OperationFinished`].
    OperationFinished {
        /// Invocation index.
        index: u64,
        /// Whether the submission succeeded.
        ok: bool,
    },
    /// See [`DriverEvent::TeardownStarted`].
    TeardownStarted,
    /// See [`DriverEvent::TeardownFinished`].
    TeardownFinished {
        /// Residual teardown issue.
        residual: Option<TeardownError>,
    },
}

impl From<&DriverEvent<'_>> for RecordedEvent {
    fn from(event: &DriverEvent<'_>) -> Self {
        match *event {
            DriverEvent::SetupStarted {
                worker_index,
                total_workers,
                round_index,
            } => Self::SetupStarted {
                worker_index,
                total_workers,
                round_index,
            },
            DriverEvent::SetupFinished { result } => Self::SetupFinished { ok: result.is_ok() },
            DriverEvent::OperationStarted { index } => Self::OperationStarted { index },
            DriverEvent::OperationFinished { index, result, .. } => Self::OperationFinished {
                index,
                ok: result.is_ok(),
            },
            DriverEvent::TeardownStarted => Self::TeardownStarted,
            DriverEvent::TeardownFinished { residual } => Self::TeardownFinished {
                residual: residual.cloned(),
            },
        }
    }
}

/// A [`DriverObserver`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingObserver {
    /// Creates a shared, empty observer.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns all events recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns the invocation indices of all started operations, in order.
    pub fn started_indices(&self) -> Vec<u64> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                RecordedEvent::OperationStarted { index } => Some(*index),
                _ => None,
            })
            .collect()
    }

    /// Returns the residual issues of all teardowns, in order.
    pub fn teardown_residuals(&self) -> Vec<Option<TeardownError>> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                RecordedEvent::TeardownFinished { residual } => Some(residual.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DriverObserver for RecordingObserver {
    fn on_event(&self, event: &DriverEvent<'_>) {
        self.events.lock().unwrap().push(event.into());
    }
}
