//! Credit ledger client
//!
//! Per-user balances in the remote `user_credits` collection. Balances
//! are lazily created on first contact and never deleted. Increment is
//! a server-side atomic addition; decrement is a client-side
//! read/clamp/write, which is NOT atomic: two concurrent decrements can
//! let a third party read a transiently inconsistent balance, though
//! the final clamped write is always >= 0. This race is accepted and
//! documented, not fixed here.

use reqwest::Client;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http;
use crate::types::{CreditRecord, IncrementRequest, PutCreditsRequest};

/// HTTP client for the credit collection
#[derive(Clone)]
pub struct CreditLedgerClient {
    base_url: String,
    app_id: String,
    default_credits: i64,
    client: Client,
}

impl CreditLedgerClient {
    /// Create a new credit ledger client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            base_url: config.store_base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            default_credits: config.default_credits,
            client: http::build_client(config.timeout_secs)?,
        })
    }

    fn credits_url(&self, user_id: &str) -> String {
        format!(
            "{}/db/{}/credits/{}",
            self.base_url,
            self.app_id,
            urlencoding::encode(user_id)
        )
    }

    async fn fetch(&self, user_id: &str) -> Result<Option<CreditRecord>> {
        let response = self
            .client
            .get(self.credits_url(user_id))
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        if http::is_not_found(&response) {
            return Ok(None);
        }
        Ok(Some(http::decode_json(response).await?))
    }

    async fn put(&self, user_id: &str, credits: i64) -> Result<()> {
        let response = self
            .client
            .put(self.credits_url(user_id))
            .json(&PutCreditsRequest { credits })
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        http::ensure_success(response).await?;
        Ok(())
    }

    /// Get the balance for a user, creating the record with the
    /// configured default seed when it does not exist yet.
    pub async fn get_or_create(&self, user_id: &str) -> Result<i64> {
        match self.fetch(user_id).await? {
            Some(record) => Ok(record.credits),
            None => {
                info!(%user_id, seed = self.default_credits, "seeding new credit balance");
                self.put(user_id, self.default_credits).await?;
                Ok(self.default_credits)
            }
        }
    }

    /// Add to a balance via the store's atomic increment.
    ///
    /// The amount may be negative; no floor is applied on this path.
    /// Creates the record with the delta as its balance when the user
    /// does not exist yet.
    pub async fn increment(&self, user_id: &str, amount: i64) -> Result<i64> {
        if self.fetch(user_id).await?.is_none() {
            self.put(user_id, amount).await?;
            return Ok(amount);
        }

        let url = format!("{}/increment", self.credits_url(user_id));
        let response = self
            .client
            .post(&url)
            .json(&IncrementRequest { amount })
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let record: CreditRecord = http::decode_json(response).await?;
        debug!(%user_id, amount, balance = record.credits, "credits incremented");
        Ok(record.credits)
    }

    /// Subtract from a balance, clamping the persisted result at zero.
    ///
    /// Read-clamp-write, not atomic against concurrent writers. Fails
    /// with a validation error when the user does not exist.
    pub async fn decrement(&self, user_id: &str, amount: i64) -> Result<i64> {
        if amount < 0 {
            return Err(ClientError::Validation(
                "decrement amount must be non-negative".to_string(),
            ));
        }

        let current = match self.fetch(user_id).await? {
            Some(record) => record.credits,
            None => {
                return Err(ClientError::Validation(format!(
                    "user {user_id} does not exist; cannot decrement credits"
                )))
            }
        };

        let next = (current - amount).max(0);
        self.put(user_id, next).await?;
        debug!(%user_id, amount, balance = next, "credits decremented");
        Ok(next)
    }

    /// Set a balance outright, clamped at zero
    pub async fn set(&self, user_id: &str, amount: i64) -> Result<i64> {
        let clamped = amount.max(0);
        self.put(user_id, clamped).await?;
        Ok(clamped)
    }
}
