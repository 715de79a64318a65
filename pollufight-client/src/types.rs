//! Types for the Pollufight client API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ClientError, Result};

/// Geolocation attached to a report, immutable after creation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Horizontal accuracy in meters, when the fix reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Altitude in meters, when the fix reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl GeoLocation {
    /// Create a location from a latitude/longitude pair
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            altitude: None,
        }
    }

    /// Set the horizontal accuracy
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Set the altitude
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Check the coordinates are finite and inside the valid ranges
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(ClientError::Validation(
                "location coordinates must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ClientError::Validation(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ClientError::Validation(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// Lifecycle status of a pollution report.
///
/// Transitions are forward-only: detected -> in_progress -> resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Freshly created, awaiting action
    Detected,
    /// Being handled
    InProgress,
    /// Closed out
    Resolved,
}

impl ReportStatus {
    /// Wire label for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Detected => "detected",
            ReportStatus::InProgress => "in_progress",
            ReportStatus::Resolved => "resolved",
        }
    }

    /// Whether moving to `next` is a forward transition
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        next > *self
    }

    /// The next forward status, if any
    pub fn next(&self) -> Option<ReportStatus> {
        match self {
            ReportStatus::Detected => Some(ReportStatus::InProgress),
            ReportStatus::InProgress => Some(ReportStatus::Resolved),
            ReportStatus::Resolved => None,
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "detected" => Ok(ReportStatus::Detected),
            "in_progress" => Ok(ReportStatus::InProgress),
            "resolved" => Ok(ReportStatus::Resolved),
            other => Err(ClientError::Validation(format!(
                "invalid status '{other}': must be one of detected, in_progress, resolved"
            ))),
        }
    }
}

/// A pollution report as stored in the remote collection.
///
/// Decoding is strict at the store boundary: a record missing its
/// location or image URL fails to decode instead of propagating nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Store-assigned identifier
    pub id: String,
    /// Lifecycle status
    pub status: ReportStatus,
    /// Where the violation was captured
    pub location: GeoLocation,
    /// Externally hosted evidence image
    pub image_url: String,
    /// Open metadata mapping (site name, category tag, flags)
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Server-assigned creation timestamp
    pub created_at: DateTime<Utc>,
    /// Refreshed on every status mutation
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a report
#[derive(Debug, Clone)]
pub struct NewReport {
    /// Capture location
    pub location: GeoLocation,
    /// Hosted image URL (or the upload-skipped sentinel)
    pub image_url: String,
    /// Open metadata mapping
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl NewReport {
    /// Create report input from a location and image URL
    pub fn new(location: GeoLocation, image_url: impl Into<String>) -> Self {
        Self {
            location,
            image_url: image_url.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Attach a site name
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.metadata
            .insert("site".to_string(), serde_json::Value::String(site.into()));
        self
    }

    /// Attach a category tag
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.metadata.insert(
            "type".to_string(),
            serde_json::Value::String(category.into()),
        );
        self
    }

    /// Attach an arbitrary metadata entry
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Local preconditions checked before any network write
    pub fn validate(&self) -> Result<()> {
        self.location.validate()?;
        if self.image_url.is_empty() {
            return Err(ClientError::Validation(
                "image URL is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Request body for report creation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateReportRequest<'a> {
    pub status: ReportStatus,
    pub location: &'a GeoLocation,
    pub image_url: &'a str,
    pub metadata: &'a serde_json::Map<String, serde_json::Value>,
}

/// Response from report creation
#[derive(Debug, Deserialize)]
pub(crate) struct CreateReportResponse {
    pub id: String,
}

/// Response from the report list endpoint.
///
/// Records are kept as raw values so one malformed record does not
/// poison the whole snapshot; each is validated individually.
#[derive(Debug, Deserialize)]
pub(crate) struct ReportListResponse {
    #[serde(default)]
    pub reports: Vec<serde_json::Value>,
    #[serde(default)]
    pub total: u64,
}

/// Request body for a status update
#[derive(Debug, Serialize)]
pub(crate) struct UpdateStatusRequest {
    pub status: ReportStatus,
}

/// Per-user credit record in the remote collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditRecord {
    /// Current balance, never persisted below zero
    pub credits: i64,
    /// Server-assigned creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Refreshed on every write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request body for a balance upsert
#[derive(Debug, Serialize)]
pub(crate) struct PutCreditsRequest {
    pub credits: i64,
}

/// Request body for an atomic increment
#[derive(Debug, Serialize)]
pub(crate) struct IncrementRequest {
    pub amount: i64,
}

/// One detected sub-object in a classification verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Object label
    pub label: String,
    /// Confidence score, trusted as-is from the remote model
    pub score: f64,
    /// Pollution category the detector attributed this object to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pollution_type: Option<String>,
    /// Bounding box, when the detector localized the object
    #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<[f64; 4]>,
    /// Which model stage produced this detection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Classification verdict for one image.
///
/// Numeric fields are client-trusted floats; no clamping is applied to
/// out-of-range values coming back from the remote model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Violation category label
    pub pollution_type: String,
    /// Overall confidence, nominally in [0, 1]
    pub confidence_level: f64,
    /// Generated complaint draft
    pub legal_draft: String,
    /// Detected sub-objects, possibly empty
    #[serde(default)]
    pub details: Vec<Detection>,
}

/// Sentiment split from the policy feedback endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibeCheck {
    pub support: f64,
    pub neutral: f64,
    pub oppose: f64,
}

/// Narrative sentiment reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepSentiment {
    pub insight: String,
    pub reasoning: String,
}

/// One recurring theme across the submitted comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeEntry {
    pub theme: String,
    pub mentions: u64,
    pub summary: String,
}

/// One novel idea surfaced from the comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnovationIdea {
    pub idea: String,
    pub context: String,
}

/// Full response from the policy feedback analysis endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAnalysis {
    pub vibe_check: VibeCheck,
    pub deep_sentiment: DeepSentiment,
    #[serde(default)]
    pub theme_map: Vec<ThemeEntry>,
    #[serde(default)]
    pub innovation_spotter: Vec<InnovationIdea>,
}
