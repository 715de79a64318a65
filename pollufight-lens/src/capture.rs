//! Capture sources
//!
//! A capture source produces a single still image, either by freezing a
//! live camera stream or by reading a user-selected file. The camera is
//! an exclusive local resource: implementations must release the device
//! on every exit path (successful freeze, error, teardown), and
//! `release` must be idempotent.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use pollufight_client::{ClientError, Result};

/// A still image produced by a capture source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// Original filename, used for provenance and bypass policy
    pub filename: String,
    /// MIME type of the payload
    pub content_type: String,
}

impl CapturedImage {
    /// Create an image payload, assuming JPEG
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type: "image/jpeg".to_string(),
        }
    }

    /// Override the MIME type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Source of a single still image.
///
/// Contract: `still` either returns a payload or a descriptive error;
/// a missing device or refused permission is the distinct
/// `DeviceUnavailable` kind so the caller can fall back to a file
/// source. `release` must be called on every exit path and must be
/// safe to call repeatedly; device-backed implementations should also
/// release in their `Drop`.
#[async_trait]
pub trait CaptureSource: Send {
    /// Produce one still image
    async fn still(&mut self) -> Result<CapturedImage>;

    /// Release the underlying device. Idempotent.
    fn release(&mut self);

    /// Whether the underlying device has been released
    fn released(&self) -> bool;
}

/// Capture from the primary (camera) source, falling back to the
/// secondary (file) source when the device is unavailable.
///
/// The primary is released on every exit path: after a successful
/// freeze, on fallback, and on any other error.
pub async fn still_with_fallback(
    primary: &mut dyn CaptureSource,
    fallback: &mut dyn CaptureSource,
) -> Result<CapturedImage> {
    let outcome = primary.still().await;
    primary.release();

    match outcome {
        Ok(image) => Ok(image),
        Err(ClientError::DeviceUnavailable(reason)) => {
            debug!(%reason, "camera unavailable, falling back to file source");
            fallback.still().await
        }
        Err(err) => Err(err),
    }
}

/// File-picker capture path: reads a still image from local storage
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    released: bool,
}

impl FileSource {
    /// Create a source for the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            released: false,
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl CaptureSource for FileSource {
    async fn still(&mut self) -> Result<CapturedImage> {
        let bytes = tokio::fs::read(&self.path).await?;
        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image.jpg")
            .to_string();
        let content_type = content_type_for(&self.path).to_string();

        debug!(%filename, size = bytes.len(), "read still image from file");
        Ok(CapturedImage {
            bytes,
            filename,
            content_type,
        })
    }

    fn release(&mut self) {
        // No device held; tracked only so callers can assert the contract.
        self.released = true;
    }

    fn released(&self) -> bool {
        self.released
    }
}

/// In-memory capture source for tests and demos.
///
/// Configurable availability, counts stills, records release.
pub struct StubSource {
    image: CapturedImage,
    available: bool,
    released: bool,
    stills: u32,
}

impl StubSource {
    /// Create a stub that yields the given image
    pub fn new(image: CapturedImage) -> Self {
        Self {
            image,
            available: true,
            released: false,
            stills: 0,
        }
    }

    /// Create a stub whose device is unavailable
    pub fn unavailable() -> Self {
        Self {
            image: CapturedImage::new(Vec::new(), "unavailable.jpg"),
            available: false,
            released: false,
            stills: 0,
        }
    }

    /// How many stills were produced
    pub fn still_count(&self) -> u32 {
        self.stills
    }
}

#[async_trait]
impl CaptureSource for StubSource {
    async fn still(&mut self) -> Result<CapturedImage> {
        if !self.available {
            // The device must be released on the error path too.
            self.release();
            return Err(ClientError::DeviceUnavailable(
                "no camera device or permission refused".to_string(),
            ));
        }
        self.stills += 1;
        Ok(self.image.clone())
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn released(&self) -> bool {
        self.released
    }
}

impl Drop for StubSource {
    fn drop(&mut self) {
        self.release();
    }
}
