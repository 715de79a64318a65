//! Client configuration
//!
//! One explicitly constructed configuration object shared by every client.
//! Built once at session start and passed by reference; there are no
//! ambient singletons or environment reads inside the clients.

use crate::error::{ClientError, Result};

/// Configuration for the Pollufight clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the hosted document store HTTP API
    pub store_base_url: String,
    /// Application ID for collection namespacing
    pub app_id: String,
    /// Base URL of the image asset host
    pub upload_base_url: String,
    /// Asset host account (bucket) name; required before any upload
    pub upload_cloud_name: Option<String>,
    /// Unsigned upload preset; required before any upload
    pub upload_preset: Option<String>,
    /// Classification endpoint URL
    pub classify_url: String,
    /// Policy feedback analysis endpoint URL (optional collaborator)
    pub feedback_url: Option<String>,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Report subscription poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Credit balance seeded on first contact with a new user id.
    /// The canonical flow seeds 0; the wallet variant seeds 150.
    pub default_credits: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            store_base_url: "http://localhost:8080".to_string(),
            app_id: "pollufight".to_string(),
            upload_base_url: "https://api.cloudinary.com".to_string(),
            upload_cloud_name: None,
            upload_preset: None,
            classify_url: "http://localhost:8000/analyze".to_string(),
            feedback_url: None,
            timeout_secs: 30,
            poll_interval_ms: 2_000,
            default_credits: 0,
        }
    }
}

impl ClientConfig {
    /// Validate store-facing configuration
    pub fn validate(&self) -> Result<()> {
        if self.store_base_url.is_empty() {
            return Err(ClientError::Config("store base URL is empty".to_string()));
        }
        if self.app_id.is_empty() {
            return Err(ClientError::Config("app id is empty".to_string()));
        }
        if self.default_credits < 0 {
            return Err(ClientError::Config(
                "default credit seed must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate upload configuration; fails before any network attempt
    /// when the account name or preset is missing.
    pub fn validate_upload(&self) -> Result<(&str, &str)> {
        let cloud = self.upload_cloud_name.as_deref().ok_or_else(|| {
            ClientError::Config("upload account name is not configured".to_string())
        })?;
        let preset = self.upload_preset.as_deref().ok_or_else(|| {
            ClientError::Config("upload preset is not configured".to_string())
        })?;
        Ok((cloud, preset))
    }
}
