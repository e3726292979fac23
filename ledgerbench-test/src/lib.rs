//! Test utilities for ledgerbench workload drivers.
//!
//! This crate provides fakes and fixtures for testing drivers without a real ledger. See the
//! modules for all available utilities.

pub mod adapter;
pub mod gateway;
pub mod observer;
pub mod tracing;
