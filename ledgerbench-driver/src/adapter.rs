use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::request::{OperationRequest, SubmitResponse};

/// User agent string used for outgoing requests.
pub const USER_AGENT: &str = concat!("ledgerbench/", env!("CARGO_PKG_VERSION"));

/// A shared, type-erased [`TargetAdapter`] instance.
pub type SharedAdapter = Arc<dyn TargetAdapter>;

/// Translates [`OperationRequest`]s into calls against the system under test.
///
/// Transport, connection pooling and retries are entirely up to the adapter. Drivers call
/// [`submit`](TargetAdapter::submit) exactly once per operation and never retry.
#[async_trait::async_trait]
pub trait TargetAdapter: Debug + Send + Sync + 'static {
    /// The adapter name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Submits a single request and waits for the target to accept or reject it.
    async fn submit(&self, request: OperationRequest) -> AdapterResult<SubmitResponse>;
}

/// Errors surfaced by a [`TargetAdapter`] when a submission fails.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The target system refused the transaction.
    #[error("rejected by target: {reason}")]
    Rejected {
        /// Reason given by the target.
        reason: String,
    },

    /// No response arrived within the configured time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Errors from the reqwest client, either on the network or as an error status.
    #[error("reqwest error: {context}")]
    Reqwest {
        /// What the adapter was doing.
        context: String,
        /// The underlying client error.
        #[source]
        cause: reqwest::Error,
    },

    /// Errors related to de/serialization of requests or responses.
    #[error("serde error: {context}")]
    Serde {
        /// What the adapter was doing.
        context: String,
        /// The underlying serde error.
        #[source]
        cause: serde_json::Error,
    },

    /// Any other error, specific to one adapter.
    #[error("target adapter error: {context}")]
    Generic {
        /// What the adapter was doing.
        context: String,
        /// The underlying error.
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
