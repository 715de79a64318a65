//! Report store client
//!
//! Create, list, live-subscribe to, and update the status of pollution
//! reports in the remote `pollution_reports` collection. Subscriptions
//! are exposed as a cancellable snapshot stream rather than a bare
//! callback closure.

use futures::Stream;
use reqwest::Client;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http;
use crate::types::{
    CreateReportRequest, CreateReportResponse, NewReport, Report, ReportListResponse,
    ReportStatus, UpdateStatusRequest,
};

/// HTTP client for the report collection
#[derive(Clone)]
pub struct ReportStoreClient {
    base_url: String,
    app_id: String,
    poll_interval: Duration,
    client: Client,
}

impl ReportStoreClient {
    /// Create a new report store client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            base_url: config.store_base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            client: http::build_client(config.timeout_secs)?,
        })
    }

    fn reports_url(&self) -> String {
        format!("{}/db/{}/reports", self.base_url, self.app_id)
    }

    fn report_url(&self, id: &str) -> String {
        format!(
            "{}/db/{}/reports/{}",
            self.base_url,
            self.app_id,
            urlencoding::encode(id)
        )
    }

    /// Create a new report.
    ///
    /// Local preconditions (finite location, non-empty image URL) are
    /// checked before any network write. New reports always start in
    /// `detected`; the store assigns id and timestamps.
    pub async fn create(&self, report: &NewReport) -> Result<String> {
        report.validate()?;

        let body = CreateReportRequest {
            status: ReportStatus::Detected,
            location: &report.location,
            image_url: &report.image_url,
            metadata: &report.metadata,
        };

        let response = self
            .client
            .post(self.reports_url())
            .json(&body)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let created: CreateReportResponse = http::decode_json(response).await?;
        info!(report_id = %created.id, "report created");
        Ok(created.id)
    }

    /// Fetch a one-shot snapshot of all reports, newest first.
    ///
    /// Records that fail validation (missing location or image URL) are
    /// skipped with a warning rather than poisoning the snapshot.
    pub async fn list(&self) -> Result<Vec<Report>> {
        let response = self
            .client
            .get(self.reports_url())
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let parsed: ReportListResponse = http::decode_json(response).await?;
        let mut reports = Vec::with_capacity(parsed.reports.len());
        for raw in parsed.reports {
            match serde_json::from_value::<Report>(raw) {
                Ok(report) => reports.push(report),
                Err(err) => warn!(error = %err, "skipping malformed report record"),
            }
        }

        debug!(count = reports.len(), total = parsed.total, "listed reports");
        Ok(reports)
    }

    /// Update the status of a report.
    ///
    /// The target status is already validated by construction of
    /// `ReportStatus`; use [`update_status_label`](Self::update_status_label)
    /// at a string boundary. Forward-only ordering is not enforced by
    /// the store; see [`advance_status`](Self::advance_status) for the
    /// checked step.
    pub async fn update_status(&self, id: &str, status: ReportStatus) -> Result<()> {
        let url = format!("{}/status", self.report_url(id));
        let response = self
            .client
            .patch(&url)
            .json(&UpdateStatusRequest { status })
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        if http::is_not_found(&response) {
            return Err(ClientError::NotFound(id.to_string()));
        }
        http::ensure_success(response).await?;
        info!(report_id = %id, status = %status, "report status updated");
        Ok(())
    }

    /// Update status from a raw label, rejecting unknown labels without
    /// a network call.
    pub async fn update_status_label(&self, id: &str, label: &str) -> Result<()> {
        let status: ReportStatus = label.parse()?;
        self.update_status(id, status).await
    }

    /// Move a report one step forward in its lifecycle.
    ///
    /// Fails locally when the report is already resolved.
    pub async fn advance_status(&self, report: &Report) -> Result<ReportStatus> {
        let next = report.status.next().ok_or_else(|| {
            ClientError::Validation(format!("report {} is already resolved", report.id))
        })?;
        self.update_status(&report.id, next).await?;
        Ok(next)
    }

    /// Delete a report. Returns false when the report does not exist.
    ///
    /// Reports are never hard-deleted in the normal flow; this exists
    /// for operator cleanup only.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let response = self
            .client
            .delete(self.report_url(id))
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        if http::is_not_found(&response) {
            return Ok(false);
        }
        http::ensure_success(response).await?;
        info!(report_id = %id, "report deleted");
        Ok(true)
    }

    /// Subscribe to report snapshots.
    ///
    /// The returned stream emits the full ordered report sequence: once
    /// immediately after establishment, then on every poll of the
    /// remote collection, in emission order. Consecutive identical
    /// snapshots are not coalesced, so redundant emissions with
    /// unchanged data are possible. A failed poll emits an empty
    /// snapshot rather than ending the stream.
    pub fn subscribe(&self) -> ReportSubscription {
        let client = self.clone();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let interval = self.poll_interval;
        let (tx, rx) = mpsc::channel(16);

        let task = tokio::spawn(async move {
            loop {
                if flag.load(Ordering::SeqCst) {
                    break;
                }

                let snapshot = match client.list().await {
                    Ok(reports) => reports,
                    Err(err) => {
                        warn!(error = %err, "report subscription poll failed");
                        Vec::new()
                    }
                };

                if flag.load(Ordering::SeqCst) || tx.send(snapshot).await.is_err() {
                    break;
                }

                tokio::time::sleep(interval).await;
            }
        });

        debug!("report subscription established");
        ReportSubscription {
            receiver: rx,
            cancelled,
            task,
        }
    }
}

/// Live subscription to report snapshots.
///
/// Detach with [`unsubscribe`](Self::unsubscribe) (idempotent, safe to
/// call any number of times); dropping the subscription detaches too.
pub struct ReportSubscription {
    receiver: mpsc::Receiver<Vec<Report>>,
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ReportSubscription {
    /// Receive the next snapshot; `None` once the subscription ends
    pub async fn recv(&mut self) -> Option<Vec<Report>> {
        self.receiver.recv().await
    }

    /// Detach the listener. Idempotent.
    pub fn unsubscribe(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.task.abort();
            debug!("report subscription detached");
        }
    }

    /// Whether the subscription has been detached
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Stream for ReportSubscription {
    type Item = Vec<Report>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for ReportSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
