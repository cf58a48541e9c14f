//! Admin model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An editor account allowed into the admin area
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    /// Login email, stored lower-cased
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    /// Build an admin from an already hashed password.
    pub fn new(email: &str, password_hash: String) -> Self {
        Self {
            id: 0, // Assigned by the database
            email: normalize_email(email),
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Canonical form of a login email
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
pub struct AdminSession {
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}
