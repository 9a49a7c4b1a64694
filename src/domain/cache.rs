//! Cached remote content with a time-to-live

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedContent {
    pub url: String,
    pub data: serde_json::Value,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedContent {
    pub fn new(
        url: impl Into<String>,
        data: serde_json::Value,
        now: DateTime<Utc>,
        ttl_minutes: u32,
    ) -> Self {
        CachedContent {
            url: url.into(),
            data,
            cached_at: now,
            expires_at: now + Duration::minutes(i64::from(ttl_minutes)),
        }
    }

    /// An entry is live up to and including `expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
