//! Classification client for the remote pollution-detection endpoint
//!
//! One request per call, no built-in retry: a failed classification is
//! surfaced to the caller, who decides whether to re-attempt.

use reqwest::multipart::Form;
use reqwest::Client;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http;
use crate::types::AnalysisResult;
use crate::upload::ImageRef;

/// HTTP client for the classification endpoint
pub struct ClassificationClient {
    endpoint: String,
    client: Client,
}

impl ClassificationClient {
    /// Create a new classification client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        if config.classify_url.is_empty() {
            return Err(ClientError::Config(
                "classification endpoint URL is empty".to_string(),
            ));
        }

        Ok(Self {
            endpoint: config.classify_url.clone(),
            client: http::build_client(config.timeout_secs)?,
        })
    }

    /// Classify an image by reference.
    ///
    /// The reference is either a hosted URL or the upload-skipped
    /// sentinel; the optional original filename is forwarded for
    /// provenance. Numeric fields in the verdict are passed through
    /// unvalidated.
    pub async fn classify(
        &self,
        image_ref: &ImageRef,
        original_filename: Option<&str>,
    ) -> Result<AnalysisResult> {
        debug!(image_ref = %image_ref, "requesting classification");

        let mut form = Form::new().text("image_url", image_ref.as_str().to_string());
        if let Some(filename) = original_filename {
            form = form.text("original_filename", filename.to_string());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let result: AnalysisResult = http::decode_json(response).await?;
        debug!(
            pollution_type = %result.pollution_type,
            confidence = result.confidence_level,
            detections = result.details.len(),
            "classification settled"
        );
        Ok(result)
    }
}
