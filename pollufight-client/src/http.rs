//! Shared HTTP plumbing for the remote-collaborator clients

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Build a reqwest client with the configured timeout
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(ClientError::Http)
}

/// Turn a non-2xx response into a `Remote` error, passing 2xx through
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Remote {
        status: status.as_u16(),
        message: body,
    })
}

/// Decode a JSON response body, mapping non-2xx statuses first.
///
/// Uses text-then-parse so a malformed body surfaces the serde detail
/// rather than an opaque transport error.
pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response).await?;
    let text = response.text().await.map_err(ClientError::Http)?;
    Ok(serde_json::from_str(&text)?)
}

/// Whether the response is a 404
pub(crate) fn is_not_found(response: &Response) -> bool {
    response.status() == StatusCode::NOT_FOUND
}
