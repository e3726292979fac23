//! Data exchanged between a harness, a driver and a target adapter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Round-specific arguments from the harness's benchmark definition.
pub type RoundArguments = BTreeMap<String, Value>;

/// Target-specific context of a single worker.
///
/// The harness prepares this before each round, for example with the identities or connection
/// profiles a worker should use. The driver treats it as opaque and only keeps it alive for the
/// duration of the round. An empty context is still a valid context.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetContext(BTreeMap<String, Value>);

impl TargetContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry to the context.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if the context has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for TargetContext {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A single invocation against the target system.
///
/// Requests are built fresh for every operation and cannot be changed once built. On the wire,
/// they are encoded as JSON with camel-cased field names:
///
/// ```json
/// {"targetId":"testgo","operationName":"InitLedger","invokerIdentity":"Admin@example.com","arguments":[]}
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    target_id: String,
    operation_name: String,
    invoker_identity: String,
    arguments: Vec<Value>,
}

impl OperationRequest {
    /// Creates a new request.
    pub fn new(
        target_id: impl Into<String>,
        operation_name: impl Into<String>,
        invoker_identity: impl Into<String>,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            operation_name: operation_name.into(),
            invoker_identity: invoker_identity.into(),
            arguments,
        }
    }

    /// The contract or service the operation is addressed to.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// The function to invoke on the target.
    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    /// The identity the operation is submitted as.
    pub fn invoker_identity(&self) -> &str {
        &self.invoker_identity
    }

    /// Positional arguments of the invocation.
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }
}

/// The outcome of a successful submission, as reported by the target adapter.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Identifier the target assigned to the transaction, if any.
    pub transaction_id: Option<String>,
    /// Result payload returned by the invoked function, if any.
    pub result: Option<Value>,
}
