//! Admin authentication
//!
//! Login checks an email/password pair against the `admins` table and opens
//! a session with an explicit expiry. Admin endpoints validate that session
//! on every request. The configured admin is seeded once at startup.

use crate::db::repositories::{AdminRepository, SessionRepository};
use crate::models::{normalize_email, Admin, AdminSession, Session};
use crate::services::password::{hash_password, verify_password, UNKNOWN_ADMIN_HASH};
use crate::services::rate_limiter::LoginRateLimiter;
use anyhow::Context;
use std::sync::Arc;

/// Default session lifetime in days
const DEFAULT_SESSION_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// Unknown email or wrong password; the two are not told apart
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Too many failed login attempts, please try again later")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct AuthService {
    admin_repo: Arc<dyn AdminRepository>,
    session_repo: Arc<dyn SessionRepository>,
    rate_limiter: Arc<LoginRateLimiter>,
    session_days: i64,
}

impl AuthService {
    pub fn new(
        admin_repo: Arc<dyn AdminRepository>,
        session_repo: Arc<dyn SessionRepository>,
        rate_limiter: Arc<LoginRateLimiter>,
    ) -> Self {
        Self::with_session_days(admin_repo, session_repo, rate_limiter, DEFAULT_SESSION_DAYS)
    }

    pub fn with_session_days(
        admin_repo: Arc<dyn AdminRepository>,
        session_repo: Arc<dyn SessionRepository>,
        rate_limiter: Arc<LoginRateLimiter>,
        session_days: i64,
    ) -> Self {
        Self {
            admin_repo,
            session_repo,
            rate_limiter,
            session_days,
        }
    }

    /// Create the admin account if no admin with that email exists.
    ///
    /// An existing account is never overwritten. Returns whether one was created.
    pub async fn seed_admin(&self, email: &str, password: &str) -> Result<bool, AuthServiceError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(anyhow::anyhow!("Admin email and password must not be empty").into());
        }

        if self.admin_repo.get_by_email(&email).await?.is_some() {
            tracing::debug!("Admin {} already present", email);
            return Ok(false);
        }

        let hash = hash_password(password)?;
        self.admin_repo
            .create(&Admin::new(&email, hash))
            .await
            .context("Failed to seed admin")?;

        tracing::info!("Seeded admin account {}", email);
        Ok(true)
    }

    /// Check credentials and open a session.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AdminSession, AuthServiceError> {
        let email = normalize_email(email);

        if self.rate_limiter.is_limited(&email).await {
            tracing::warn!("Login rate limited for {}", email);
            return Err(AuthServiceError::RateLimited);
        }

        let admin = self.admin_repo.get_by_email(&email).await?;
        let hash = admin
            .as_ref()
            .map_or(UNKNOWN_ADMIN_HASH, |a| a.password_hash.as_str());
        let verified = verify_password(password, hash)?;

        let admin = match admin {
            Some(admin) if verified => admin,
            _ => {
                self.rate_limiter.record_failure(&email).await;
                tracing::warn!("Failed login for {}", email);
                return Err(AuthServiceError::InvalidCredentials);
            }
        };

        self.rate_limiter.clear(&email).await;

        let session = self
            .session_repo
            .create(&Session::start(admin.id, self.session_days)?)
            .await?;

        tracing::info!("Admin {} logged in", admin.email);
        Ok(AdminSession {
            token: session.id,
            email: admin.email,
            expires_at: session.expires_at,
        })
    }

    /// The admin behind a session token, if the session is live.
    ///
    /// Expired sessions are deleted when seen.
    pub async fn validate_session(&self, token: &str) -> Result<Option<Admin>, AuthServiceError> {
        let Some(session) = self.session_repo.get_by_id(token).await? else {
            return Ok(None);
        };

        if session.is_expired() {
            self.session_repo.delete(&session.id).await?;
            return Ok(None);
        }

        Ok(self.admin_repo.get_by_id(session.admin_id).await?)
    }

    /// End a session. Succeeds whether or not a session was open.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), AuthServiceError> {
        if let Some(token) = token {
            self.session_repo.delete(token).await?;
        }
        Ok(())
    }

    /// Remove expired sessions and stale login failures
    pub async fn cleanup(&self) -> Result<u64, AuthServiceError> {
        let removed = self.session_repo.delete_expired().await?;
        self.rate_limiter.cleanup().await;
        Ok(removed)
    }
}
