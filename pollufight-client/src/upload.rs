//! Upload client for the remote image asset host
//!
//! Packages raw image bytes as a multipart payload against the host's
//! unsigned-upload endpoint. Account name and preset come from
//! configuration; their absence is reported before any network call.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http;

/// Sentinel image reference used when the caller skipped the upload
pub const SKIPPED_SENTINEL: &str = "skipped";

/// Reference to an image carried through the capture flow.
///
/// Either a stable hosted URL, or the "skipped" sentinel when a
/// caller-side policy bypassed the upload entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Dereferenceable URL on the asset host
    Hosted(String),
    /// Upload was bypassed; the sentinel is sent downstream verbatim
    Skipped,
}

impl ImageRef {
    /// Wire value for this reference
    pub fn as_str(&self) -> &str {
        match self {
            ImageRef::Hosted(url) => url,
            ImageRef::Skipped => SKIPPED_SENTINEL,
        }
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successfully uploaded asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// Stable dereferenceable URL
    pub url: String,
    /// Opaque asset identifier assigned by the host
    pub public_id: Option<String>,
}

/// Success/failure body from the asset host
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
    error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    message: Option<String>,
}

/// HTTP client for the image asset host
pub struct UploadClient {
    endpoint: String,
    preset: String,
    client: Client,
}

impl UploadClient {
    /// Create a new upload client.
    ///
    /// Fails with a configuration error when the account name or upload
    /// preset is missing, before any network round-trip is attempted.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let (cloud, preset) = config.validate_upload()?;
        let endpoint = format!(
            "{}/v1_1/{}/image/upload",
            config.upload_base_url.trim_end_matches('/'),
            cloud
        );

        Ok(Self {
            endpoint,
            preset: preset.to_string(),
            client: http::build_client(config.timeout_secs)?,
        })
    }

    /// Upload raw image bytes, returning the hosted asset on success.
    ///
    /// Never leaves the caller without a branchable outcome: the result
    /// is either a well-formed URL or a descriptive error.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadedAsset> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.preset.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let status = response.status();
        let text = response.text().await.map_err(ClientError::Http)?;
        let body: UploadResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(err) if status.is_success() => return Err(ClientError::Json(err)),
            // Non-2xx with a non-JSON body: keep the status and raw text.
            Err(_) => {
                return Err(ClientError::Remote {
                    status: status.as_u16(),
                    message: text,
                })
            }
        };

        match body.secure_url {
            Some(url) => {
                debug!(%url, "image upload succeeded");
                Ok(UploadedAsset {
                    url,
                    public_id: body.public_id,
                })
            }
            None => {
                let message = body
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "upload failed".to_string());
                warn!(status = status.as_u16(), %message, "image upload rejected");
                Err(ClientError::Remote {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}
