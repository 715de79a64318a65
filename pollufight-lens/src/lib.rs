//! Capture and verification flow for Pollufight reports
//!
//! Takes a still image from a camera or file picker, runs it through
//! the upload and classification clients, and tracks the result in a
//! small reset-safe state machine.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pollufight_client::{ClassificationClient, ClientConfig, UploadClient};
//! use pollufight_lens::{CaptureSource, FileSource, LensEngine, LensPhase};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig {
//!     upload_cloud_name: Some("pollufight".into()),
//!     upload_preset: Some("citizen-reports".into()),
//!     ..Default::default()
//! };
//!
//! let lens = LensEngine::new(
//!     Arc::new(UploadClient::new(&config)?),
//!     Arc::new(ClassificationClient::new(&config)?),
//! );
//!
//! let mut picker = FileSource::new("evidence.jpg");
//! let image = picker.still().await?;
//!
//! let snapshot = lens.process(image).await;
//! if snapshot.phase == LensPhase::Verified {
//!     println!("verdict: {:?}", snapshot.result);
//! }
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod lens;

// Re-export main types
pub use capture::{still_with_fallback, CaptureSource, CapturedImage, FileSource, StubSource};
pub use lens::{
    BypassPolicy, ImageAnalyzer, ImageUploader, KeywordBypass, LensEngine, LensPhase,
    LensSnapshot, NoBypass, DEMO_KEYWORDS, DEMO_UPLOAD_DELAY,
};
