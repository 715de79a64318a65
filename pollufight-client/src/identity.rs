//! Per-installation user identity
//!
//! One opaque user id, generated on first use and persisted under a
//! fixed key. This id is NOT a security credential: no authentication
//! is performed and any client can claim any id. The store is an
//! explicitly constructed object handed to whoever needs it, not a
//! process-wide singleton.

use std::fs;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

/// Fixed key (file name) the user id is persisted under
pub const USER_ID_KEY: &str = "pollufight_user_id";

/// File-backed store for the per-installation user id
#[derive(Debug, Clone)]
pub struct UserIdStore {
    dir: PathBuf,
}

impl UserIdStore {
    /// Create a store rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(USER_ID_KEY)
    }

    /// Load the persisted user id, generating and persisting a fresh
    /// one on first use.
    pub fn load_or_generate(&self) -> Result<String> {
        let path = self.path();
        if let Ok(existing) = fs::read_to_string(&path) {
            let existing = existing.trim();
            if !existing.is_empty() {
                return Ok(existing.to_string());
            }
        }

        let id = generate_user_id();
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, &id)?;
        debug!(user_id = %id, "generated new user id");
        Ok(id)
    }
}

/// Generate a fresh opaque user id (`user_<millis>_<suffix>`)
pub fn generate_user_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("user_{}_{}", millis, &suffix[..9])
}
