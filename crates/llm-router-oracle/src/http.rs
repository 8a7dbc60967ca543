use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::debug;

use crate::{OracleConfig, OracleError};

/// Build the shared HTTP client for a provider
pub(crate) fn build_client(config: &OracleConfig) -> Result<Client, OracleError> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| OracleError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

/// Send a prepared request and decode its JSON body
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, OracleError> {
    let start = Instant::now();

    let response = request
        .send()
        .await
        .map_err(|e| OracleError::Transport(e.to_string()))?;

    let status = response.status();
    debug!(
        status = status.as_u16(),
        duration_ms = start.elapsed().as_millis(),
        "Oracle responded"
    );

    if status.as_u16() == 429 {
        return Err(OracleError::RateLimited);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(OracleError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| OracleError::MalformedResponse(e.to_string()))
}
