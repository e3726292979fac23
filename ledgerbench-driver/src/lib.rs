//! Workload drivers for blockchain benchmarking harnesses.
//!
//! A load-generation harness schedules rounds and workers, and hands every worker its own
//! [`WorkloadDriver`]. The driver is a thin adapter between the harness and the system under
//! test: it is [set up](WorkloadDriver::setup) with the worker's [`RoundContext`], asked to
//! [perform operations](WorkloadDriver::perform_operation) as often as the round demands, and
//! finally [torn down](WorkloadDriver::teardown).
//!
//! Each operation builds an [`OperationRequest`] and submits it through a [`TargetAdapter`], which
//! owns transport and connection handling. [`InitLedgerDriver`] submits the same `InitLedger`
//! contract invocation on every operation, and [`HttpAdapter`] delivers requests to a ledger's REST
//! gateway.
//!
//! Drivers report their progress to a [`DriverObserver`] rather than logging on their own.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod adapter;
pub mod config;
mod driver;
mod error;
pub mod http;
mod in_flight;
mod init_ledger;
pub mod observability;
mod observer;
mod request;

pub use crate::adapter::*;
pub use crate::driver::*;
pub use crate::error::*;
pub use crate::http::{HttpAdapter, HttpAdapterBuilder};
pub use crate::init_ledger::InitLedgerDriver;
pub use crate::observer::*;
pub use crate::request::*;
