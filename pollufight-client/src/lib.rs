//! Client SDK for the Pollufight pollution-reporting backend
//!
//! Thin, explicitly configured clients for the product's remote
//! collaborators: the image asset host, the classification endpoint,
//! the hosted document store (`pollution_reports` and `user_credits`
//! collections), and the optional policy feedback service.
//!
//! # Example
//!
//! ```rust,no_run
//! use pollufight_client::{ClientConfig, GeoLocation, NewReport, ReportStoreClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig {
//!     store_base_url: "https://store.pollufight.example".into(),
//!     ..Default::default()
//! };
//!
//! let reports = ReportStoreClient::new(&config)?;
//!
//! // File a report
//! let id = reports
//!     .create(
//!         &NewReport::new(GeoLocation::new(28.46, 77.03), "https://x/img.jpg")
//!             .with_category("Industrial"),
//!     )
//!     .await?;
//!
//! // Watch the collection
//! let mut subscription = reports.subscribe();
//! if let Some(snapshot) = subscription.recv().await {
//!     println!("{} reports on the map", snapshot.len());
//! }
//! subscription.unsubscribe();
//! # let _ = id;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod credits;
pub mod error;
pub mod feedback;
mod http;
pub mod identity;
pub mod reports;
pub mod types;
pub mod upload;

// Re-export main types
pub use classify::ClassificationClient;
pub use config::ClientConfig;
pub use credits::CreditLedgerClient;
pub use error::{ClientError, Result};
pub use feedback::PolicyFeedbackClient;
pub use identity::{generate_user_id, UserIdStore, USER_ID_KEY};
pub use reports::{ReportStoreClient, ReportSubscription};
pub use types::*;
pub use upload::{ImageRef, UploadClient, UploadedAsset, SKIPPED_SENTINEL};
