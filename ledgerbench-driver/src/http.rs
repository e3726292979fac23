//! Contains a target adapter that submits transactions to a ledger's REST gateway.

use std::time::Duration;

use crate::adapter::{AdapterError, AdapterResult, TargetAdapter, USER_AGENT};
use crate::config::Gateway;
use crate::request::{OperationRequest, SubmitResponse};

/// A builder for creating an [`HttpAdapter`].
#[derive(Debug)]
pub struct HttpAdapterBuilder {
    endpoint: String,
    channel: String,
    timeout: Duration,
}

impl HttpAdapterBuilder {
    /// The channel that transactions are submitted to.
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// The time to wait for the gateway to accept a transaction.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Creates the adapter instance.
    pub fn build(self) -> AdapterResult<HttpAdapter> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|cause| AdapterError::Reqwest {
                context: "failed to build http client".to_owned(),
                cause,
            })?;

        Ok(HttpAdapter {
            client,
            endpoint: self.endpoint.trim_end_matches('/').to_owned(),
            channel: self.channel,
            timeout: self.timeout,
        })
    }
}

/// A target adapter using HTTP to submit transactions to a ledger gateway.
///
/// Every request is sent as JSON to `POST {endpoint}/channels/{channel}/transactions`. The
/// gateway answers with a [`SubmitResponse`] once the transaction has been accepted, or with a
/// client error status if it was rejected.
#[derive(Debug)]
pub struct HttpAdapter {
    client: reqwest::Client,
    endpoint: String,
    channel: String,
    timeout: Duration,
}

impl HttpAdapter {
    /// Constructs a new adapter builder for the gateway at `endpoint`.
    pub fn builder(endpoint: impl Into<String>) -> HttpAdapterBuilder {
        let defaults = Gateway::default();
        HttpAdapterBuilder {
            endpoint: endpoint.into(),
            channel: defaults.channel,
            timeout: defaults.timeout,
        }
    }

    /// Creates an adapter from the gateway configuration.
    pub fn from_config(gateway: &Gateway) -> AdapterResult<Self> {
        Self::builder(gateway.endpoint.as_str())
            .channel(gateway.channel.as_str())
            .timeout(gateway.timeout)
            .build()
    }

    fn transactions_url(&self) -> String {
        format!("{}/channels/{}/transactions", self.endpoint, self.channel)
    }

    fn reqwest_error(&self, context: &str, cause: reqwest::Error) -> AdapterError {
        if cause.is_timeout() {
            return AdapterError::Timeout(self.timeout);
        }

        AdapterError::Reqwest {
            context: context.to_owned(),
            cause,
        }
    }
}

#[async_trait::async_trait]
impl TargetAdapter for HttpAdapter {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn submit(&self, request: OperationRequest) -> AdapterResult<SubmitResponse> {
        let response = self
            .client
            .post(self.transactions_url())
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|cause| self.reqwest_error("failed to send transaction", cause))?;

        if response.status().is_client_error() {
            let status = response.status();
            let reason = response
                .text()
                .await
                .map_err(|cause| self.reqwest_error("failed to read rejection", cause))?;
            tracing::debug!(%status, %reason, "gateway rejected transaction");
            return Err(AdapterError::Rejected { reason });
        }

        let response = response
            .error_for_status()
            .map_err(|cause| self.reqwest_error("gateway failed to submit transaction", cause))?;
        let body = response
            .bytes()
            .await
            .map_err(|cause| self.reqwest_error("failed to read response", cause))?;

        if body.is_empty() {
            return Ok(SubmitResponse::default());
        }

        serde_json::from_slice(&body).map_err(|cause| AdapterError::Serde {
            context: "failed to parse submit response".to_owned(),
            cause,
        })
    }
}
