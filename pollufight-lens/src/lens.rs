//! Lens state machine
//!
//! Drives one captured image through upload and classification:
//! `Capture -> Uploading -> Analyzing -> Verified | Error`, with
//! `reset` returning to a clean `Capture` from either terminal phase.
//!
//! Every state commit is gated on an attempt token, so a settlement
//! arriving after `reset` is discarded instead of corrupting the next
//! attempt.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use pollufight_client::{
    AnalysisResult, ClassificationClient, ImageRef, Result, UploadClient, UploadedAsset,
};

use crate::capture::CapturedImage;

/// Demo filename keywords that bypass the real upload
pub const DEMO_KEYWORDS: &[&str] = &[
    "waste", "trash", "garbage", "rubbish", "dump", "plastic", "bottle", "car", "vehicle",
    "traffic", "truck", "bus", "smoke", "fire", "factory", "industry", "chimney",
];

/// Simulated upload time when the bypass policy applies
pub const DEMO_UPLOAD_DELAY: Duration = Duration::from_millis(1_500);

/// Progress checkpoints: upload and analysis each contribute up to half
/// before the terminal jump to 100 on settlement.
const PROGRESS_UPLOAD_STARTED: u8 = 10;
const PROGRESS_ANALYSIS_STARTED: u8 = 50;
const PROGRESS_DONE: u8 = 100;

/// Caller-side policy deciding whether to skip the upload for a file
pub trait BypassPolicy: Send + Sync {
    /// Whether the upload should be bypassed for this filename
    fn should_bypass_upload(&self, filename: &str) -> bool;
}

/// Default policy: bypass when the filename contains a demo keyword
#[derive(Debug, Clone)]
pub struct KeywordBypass {
    keywords: Vec<String>,
}

impl KeywordBypass {
    /// Policy over a custom keyword list
    pub fn new(keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for KeywordBypass {
    fn default() -> Self {
        Self::new(DEMO_KEYWORDS.iter().copied())
    }
}

impl BypassPolicy for KeywordBypass {
    fn should_bypass_upload(&self, filename: &str) -> bool {
        let lowered = filename.to_lowercase();
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

/// Policy that never bypasses the upload
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBypass;

impl BypassPolicy for NoBypass {
    fn should_bypass_upload(&self, _filename: &str) -> bool {
        false
    }
}

/// Upload seam for the lens flow
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Upload a captured image to the asset host
    async fn upload(&self, image: &CapturedImage) -> Result<UploadedAsset>;
}

#[async_trait]
impl ImageUploader for UploadClient {
    async fn upload(&self, image: &CapturedImage) -> Result<UploadedAsset> {
        UploadClient::upload(
            self,
            image.bytes.clone(),
            &image.filename,
            &image.content_type,
        )
        .await
    }
}

/// Classification seam for the lens flow
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Classify an image by reference
    async fn analyze(
        &self,
        image_ref: &ImageRef,
        original_filename: Option<&str>,
    ) -> Result<AnalysisResult>;
}

#[async_trait]
impl ImageAnalyzer for ClassificationClient {
    async fn analyze(
        &self,
        image_ref: &ImageRef,
        original_filename: Option<&str>,
    ) -> Result<AnalysisResult> {
        self.classify(image_ref, original_filename).await
    }
}

/// Phase of the lens flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LensPhase {
    /// Waiting for a shutter press or file selection
    Capture,
    /// Upload (or simulated upload) in flight
    Uploading,
    /// Classification in flight
    Analyzing,
    /// Verdict received
    Verified,
    /// Upload or classification failed
    Error,
}

/// Point-in-time view of the lens state
#[derive(Debug, Clone, PartialEq)]
pub struct LensSnapshot {
    /// Current phase
    pub phase: LensPhase,
    /// Monotonically non-decreasing progress percentage, UI-only
    pub progress: u8,
    /// Image reference carried forward from the upload phase
    pub image_ref: Option<ImageRef>,
    /// Verdict, present in `Verified`
    pub result: Option<AnalysisResult>,
    /// Human-readable failure message, present in `Error`
    pub error: Option<String>,
}

struct LensInner {
    phase: LensPhase,
    progress: u8,
    attempt: u64,
    image_ref: Option<ImageRef>,
    result: Option<AnalysisResult>,
    error: Option<String>,
}

impl LensInner {
    fn snapshot(&self) -> LensSnapshot {
        LensSnapshot {
            phase: self.phase,
            progress: self.progress,
            image_ref: self.image_ref.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }

    fn bump_progress(&mut self, to: u8) {
        self.progress = self.progress.max(to);
    }
}

/// Orchestrates capture, upload, and classification into the
/// user-facing verify flow.
pub struct LensEngine {
    uploader: Arc<dyn ImageUploader>,
    analyzer: Arc<dyn ImageAnalyzer>,
    bypass: Arc<dyn BypassPolicy>,
    demo_delay: Duration,
    inner: Arc<Mutex<LensInner>>,
}

impl LensEngine {
    /// Create an engine over the given upload and classification seams
    pub fn new(uploader: Arc<dyn ImageUploader>, analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        Self {
            uploader,
            analyzer,
            bypass: Arc::new(KeywordBypass::default()),
            demo_delay: DEMO_UPLOAD_DELAY,
            inner: Arc::new(Mutex::new(LensInner {
                phase: LensPhase::Capture,
                progress: 0,
                attempt: 0,
                image_ref: None,
                result: None,
                error: None,
            })),
        }
    }

    /// Replace the upload bypass policy
    pub fn with_bypass_policy(mut self, policy: Arc<dyn BypassPolicy>) -> Self {
        self.bypass = policy;
        self
    }

    /// Override the simulated upload delay used on the bypass path
    pub fn with_demo_delay(mut self, delay: Duration) -> Self {
        self.demo_delay = delay;
        self
    }

    /// Current state
    pub async fn snapshot(&self) -> LensSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Apply a mutation only if the attempt is still current; a stale
    /// settlement from an abandoned attempt is discarded.
    async fn commit<F>(&self, attempt: u64, apply: F) -> bool
    where
        F: FnOnce(&mut LensInner),
    {
        let mut inner = self.inner.lock().await;
        if inner.attempt != attempt {
            debug!(attempt, current = inner.attempt, "discarding stale settlement");
            return false;
        }
        apply(&mut inner);
        true
    }

    /// Run one captured image through the flow to settlement.
    ///
    /// Starting a new attempt while a previous one is in flight is not
    /// supported: the call is rejected and the current state returned
    /// unchanged. Upload failure transitions straight to `Error`
    /// without visiting `Analyzing`.
    pub async fn process(&self, image: CapturedImage) -> LensSnapshot {
        let attempt = {
            let mut inner = self.inner.lock().await;
            if inner.phase != LensPhase::Capture {
                warn!(phase = ?inner.phase, "capture rejected: attempt already in flight");
                return inner.snapshot();
            }
            inner.attempt += 1;
            inner.phase = LensPhase::Uploading;
            inner.bump_progress(PROGRESS_UPLOAD_STARTED);
            inner.attempt
        };

        let image_ref = if self.bypass.should_bypass_upload(&image.filename) {
            debug!(filename = %image.filename, "demo capture, skipping upload");
            // Keep the uploading phase visible for UI feedback timing.
            tokio::time::sleep(self.demo_delay).await;
            ImageRef::Skipped
        } else {
            match self.uploader.upload(&image).await {
                Ok(asset) => ImageRef::Hosted(asset.url),
                Err(err) => {
                    self.commit(attempt, |inner| {
                        inner.phase = LensPhase::Error;
                        inner.error = Some(format!("Upload failed: {err}"));
                    })
                    .await;
                    return self.snapshot().await;
                }
            }
        };

        let carried = image_ref.clone();
        if !self
            .commit(attempt, move |inner| {
                inner.phase = LensPhase::Analyzing;
                inner.bump_progress(PROGRESS_ANALYSIS_STARTED);
                inner.image_ref = Some(carried);
            })
            .await
        {
            return self.snapshot().await;
        }

        match self
            .analyzer
            .analyze(&image_ref, Some(&image.filename))
            .await
        {
            Ok(result) => {
                self.commit(attempt, |inner| {
                    inner.phase = LensPhase::Verified;
                    inner.bump_progress(PROGRESS_DONE);
                    inner.result = Some(result);
                })
                .await;
            }
            Err(err) => {
                self.commit(attempt, |inner| {
                    inner.phase = LensPhase::Error;
                    inner.error = Some(format!("Analysis failed: {err}"));
                })
                .await;
            }
        }

        self.snapshot().await
    }

    /// Return to `Capture`, unconditionally clearing all carried state.
    ///
    /// Any still-pending settlement from the abandoned attempt will be
    /// discarded when it arrives.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.attempt += 1;
        inner.phase = LensPhase::Capture;
        inner.progress = 0;
        inner.image_ref = None;
        inner.result = None;
        inner.error = None;
        debug!("lens reset to capture");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollufight_client::ClientError;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct MockUploader {
        fail: bool,
        delay: Duration,
        calls: AtomicU32,
    }

    impl MockUploader {
        fn ok() -> Self {
            Self {
                fail: false,
                delay: Duration::ZERO,
                calls: AtomicU32::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::ok()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::ok()
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageUploader for MockUploader {
        async fn upload(&self, _image: &CapturedImage) -> Result<UploadedAsset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(ClientError::Remote {
                    status: 500,
                    message: "asset host exploded".to_string(),
                });
            }
            Ok(UploadedAsset {
                url: "https://assets/img.jpg".to_string(),
                public_id: Some("img".to_string()),
            })
        }
    }

    struct MockAnalyzer {
        result: AnalysisResult,
        fail: bool,
        saw_sentinel: AtomicBool,
        calls: AtomicU32,
    }

    impl MockAnalyzer {
        fn with_result(result: AnalysisResult) -> Self {
            Self {
                result,
                fail: false,
                saw_sentinel: AtomicBool::new(false),
                calls: AtomicU32::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::with_result(sample_result())
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageAnalyzer for MockAnalyzer {
        async fn analyze(
            &self,
            image_ref: &ImageRef,
            _original_filename: Option<&str>,
        ) -> Result<AnalysisResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *image_ref == ImageRef::Skipped {
                self.saw_sentinel.store(true, Ordering::SeqCst);
            }
            if self.fail {
                return Err(ClientError::Remote {
                    status: 502,
                    message: "model offline".to_string(),
                });
            }
            Ok(self.result.clone())
        }
    }

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            pollution_type: "Waste Dumping".to_string(),
            confidence_level: 0.91,
            legal_draft: "...".to_string(),
            details: vec![pollufight_client::Detection {
                label: "bottle".to_string(),
                score: 0.8,
                pollution_type: None,
                bounding_box: None,
                source: None,
            }],
        }
    }

    fn engine(
        uploader: Arc<MockUploader>,
        analyzer: Arc<MockAnalyzer>,
    ) -> LensEngine {
        LensEngine::new(uploader, analyzer).with_demo_delay(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_demo_capture_skips_upload_and_verifies() {
        let uploader = Arc::new(MockUploader::ok());
        let analyzer = Arc::new(MockAnalyzer::with_result(sample_result()));
        let lens = engine(Arc::clone(&uploader), Arc::clone(&analyzer));

        let snapshot = lens
            .process(CapturedImage::new(vec![1], "demo-trash-bottle.jpg"))
            .await;

        assert_eq!(snapshot.phase, LensPhase::Verified);
        assert_eq!(snapshot.progress, 100);
        assert_eq!(snapshot.result, Some(sample_result()));
        assert_eq!(snapshot.image_ref, Some(ImageRef::Skipped));
        assert_eq!(uploader.call_count(), 0);
        assert!(analyzer.saw_sentinel.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_regular_capture_uploads_then_verifies() {
        let uploader = Arc::new(MockUploader::ok());
        let analyzer = Arc::new(MockAnalyzer::with_result(sample_result()));
        let lens = engine(Arc::clone(&uploader), Arc::clone(&analyzer));

        let snapshot = lens
            .process(CapturedImage::new(vec![1], "evidence-0231.jpg"))
            .await;

        assert_eq!(snapshot.phase, LensPhase::Verified);
        assert_eq!(
            snapshot.image_ref,
            Some(ImageRef::Hosted("https://assets/img.jpg".to_string()))
        );
        assert_eq!(uploader.call_count(), 1);
    }

    #[tokio::test]
    async fn test_upload_failure_skips_analyzing() {
        let uploader = Arc::new(MockUploader::failing());
        let analyzer = Arc::new(MockAnalyzer::with_result(sample_result()));
        let lens = engine(Arc::clone(&uploader), Arc::clone(&analyzer));

        let snapshot = lens
            .process(CapturedImage::new(vec![1], "evidence-0231.jpg"))
            .await;

        assert_eq!(snapshot.phase, LensPhase::Error);
        let message = snapshot.error.unwrap();
        assert!(message.starts_with("Upload failed:"));
        assert!(!message.trim().is_empty());
        // Never visited analyzing
        assert_eq!(analyzer.call_count(), 0);
        assert!(snapshot.progress < PROGRESS_ANALYSIS_STARTED);
    }

    #[tokio::test]
    async fn test_analysis_failure_lands_in_error() {
        let uploader = Arc::new(MockUploader::ok());
        let analyzer = Arc::new(MockAnalyzer::failing());
        let lens = engine(uploader, analyzer);

        let snapshot = lens
            .process(CapturedImage::new(vec![1], "evidence-0231.jpg"))
            .await;

        assert_eq!(snapshot.phase, LensPhase::Error);
        assert!(snapshot.error.unwrap().starts_with("Analysis failed:"));
    }

    #[tokio::test]
    async fn test_reset_clears_all_carried_state() {
        let uploader = Arc::new(MockUploader::ok());
        let analyzer = Arc::new(MockAnalyzer::with_result(sample_result()));
        let lens = engine(uploader, analyzer);

        lens.process(CapturedImage::new(vec![1], "evidence.jpg"))
            .await;
        lens.reset().await;

        let snapshot = lens.snapshot().await;
        assert_eq!(snapshot.phase, LensPhase::Capture);
        assert_eq!(snapshot.progress, 0);
        assert!(snapshot.image_ref.is_none());
        assert!(snapshot.result.is_none());
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_late_settlement_after_reset_is_discarded() {
        let uploader = Arc::new(MockUploader::slow(Duration::from_millis(50)));
        let analyzer = Arc::new(MockAnalyzer::with_result(sample_result()));
        let lens = Arc::new(engine(uploader, analyzer));

        let in_flight = {
            let lens = Arc::clone(&lens);
            tokio::spawn(async move {
                lens.process(CapturedImage::new(vec![1], "evidence.jpg"))
                    .await
            })
        };

        // Let the attempt reach the upload await, then abandon it.
        tokio::time::sleep(Duration::from_millis(10)).await;
        lens.reset().await;

        in_flight.await.unwrap();

        let snapshot = lens.snapshot().await;
        assert_eq!(snapshot.phase, LensPhase::Capture);
        assert_eq!(snapshot.progress, 0);
        assert!(snapshot.result.is_none());
        assert!(snapshot.image_ref.is_none());
    }

    #[tokio::test]
    async fn test_second_capture_rejected_while_in_flight() {
        let uploader = Arc::new(MockUploader::slow(Duration::from_millis(50)));
        let analyzer = Arc::new(MockAnalyzer::with_result(sample_result()));
        let lens = Arc::new(engine(Arc::clone(&uploader), analyzer));

        let first = {
            let lens = Arc::clone(&lens);
            tokio::spawn(async move {
                lens.process(CapturedImage::new(vec![1], "evidence.jpg"))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        let rejected = lens
            .process(CapturedImage::new(vec![2], "second.jpg"))
            .await;
        assert_eq!(rejected.phase, LensPhase::Uploading);

        let settled = first.await.unwrap();
        assert_eq!(settled.phase, LensPhase::Verified);
        assert_eq!(uploader.call_count(), 1);
    }

    #[test]
    fn test_keyword_bypass_matches_demo_filenames() {
        let policy = KeywordBypass::default();
        assert!(policy.should_bypass_upload("demo-trash-bottle.jpg"));
        assert!(policy.should_bypass_upload("Factory-Smoke.PNG"));
        assert!(!policy.should_bypass_upload("IMG_2041.jpg"));
        assert!(!NoBypass.should_bypass_upload("demo-trash-bottle.jpg"));
    }
}
