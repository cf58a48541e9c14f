//! Session repository
//!
//! Database operations for admin sessions.

use crate::db::pool::{backend, Backend};
use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session; deleting an unknown id is not an error
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete expired sessions, returning how many were removed
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based session repository
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

const INSERT_SESSION: &str = r#"
    INSERT INTO sessions (id, admin_id, expires_at, created_at)
    VALUES (?, ?, ?, ?)
"#;

const SELECT_SESSION: &str = r#"
    SELECT id, admin_id, expires_at, created_at
    FROM sessions
    WHERE id = ?
"#;

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => create_session_sqlite(p, session).await,
            Backend::Mysql(p) => create_session_mysql(p, session).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => {
                let row = sqlx::query(SELECT_SESSION)
                    .bind(id)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get session by ID")?;
                row.map(|r| row_to_session_sqlite(&r)).transpose()
            }
            Backend::Mysql(p) => {
                let row = sqlx::query(SELECT_SESSION)
                    .bind(id)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get session by ID")?;
                row.map(|r| row_to_session_mysql(&r)).transpose()
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let sql = "DELETE FROM sessions WHERE id = ?";
        match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(p)
                    .await
                    .context("Failed to delete session")?;
            }
            Backend::Mysql(p) => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(p)
                    .await
                    .context("Failed to delete session")?;
            }
        }

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let sql = "DELETE FROM sessions WHERE expires_at < ?";
        let now = Utc::now();
        let removed = match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => sqlx::query(sql).bind(now).execute(p).await?.rows_affected(),
            Backend::Mysql(p) => sqlx::query(sql).bind(now).execute(p).await?.rows_affected(),
        };
        Ok(removed)
    }
}

async fn create_session_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    sqlx::query(INSERT_SESSION)
        .bind(&session.id)
        .bind(session.admin_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(pool)
        .await
        .context("Failed to create session")?;

    Ok(session.clone())
}

async fn create_session_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    sqlx::query(INSERT_SESSION)
        .bind(&session.id)
        .bind(session.admin_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(pool)
        .await
        .context("Failed to create session")?;

    Ok(session.clone())
}

fn row_to_session_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Session> {
    Ok(Session {
        id: row.try_get("id")?,
        admin_id: row.try_get("admin_id")?,
        expires_at: row.try_get("expires_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_session_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Session> {
    let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Session {
        id: row.try_get("id")?,
        admin_id: row.try_get("admin_id")?,
        expires_at,
        created_at,
    })
}
