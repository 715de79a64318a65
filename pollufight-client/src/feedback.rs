//! Policy feedback analysis client
//!
//! Optional collaborator: submits citizen comments for aggregate
//! sentiment and theme analysis.

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http;
use crate::types::FeedbackAnalysis;

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    comments: &'a [String],
}

/// HTTP client for the policy feedback endpoint
pub struct PolicyFeedbackClient {
    endpoint: String,
    client: Client,
}

impl PolicyFeedbackClient {
    /// Create a new feedback client; fails when the endpoint is not
    /// configured.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.feedback_url.clone().ok_or_else(|| {
            ClientError::Config("feedback endpoint URL is not configured".to_string())
        })?;

        Ok(Self {
            endpoint,
            client: http::build_client(config.timeout_secs)?,
        })
    }

    /// Analyze a batch of comments
    pub async fn analyze(&self, comments: &[String]) -> Result<FeedbackAnalysis> {
        debug!(count = comments.len(), "submitting comments for analysis");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest { comments })
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        http::decode_json(response).await
    }
}
