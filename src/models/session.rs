//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated admin session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session token
    pub id: String,
    pub admin_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Start a new session for `admin_id` lasting `days` days.
    ///
    /// Fails for a non-positive lifetime or one past the representable range.
    pub fn start(admin_id: i64, days: i64) -> anyhow::Result<Self> {
        if days <= 0 {
            anyhow::bail!("Session lifetime must be positive, got {} days", days);
        }

        let now = Utc::now();
        let expires_at = Duration::try_days(days)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| anyhow::anyhow!("Session lifetime of {} days is out of range", days))?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            admin_id,
            expires_at,
            created_at: now,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
