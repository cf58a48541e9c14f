//! Admin repository
//!
//! Database operations for admin accounts.

use crate::db::pool::{backend, Backend};
use crate::db::DynDatabasePool;
use crate::models::Admin;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Admin repository trait
#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn create(&self, admin: &Admin) -> Result<Admin>;

    /// Get admin by email (exact match on the stored, lower-cased form)
    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based admin repository
pub struct SqlxAdminRepository {
    pool: DynDatabasePool,
}

impl SqlxAdminRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdminRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_ADMIN: &str = "SELECT id, email, password_hash, created_at FROM admins";

#[async_trait]
impl AdminRepository for SqlxAdminRepository {
    async fn create(&self, admin: &Admin) -> Result<Admin> {
        match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => create_admin_sqlite(p, admin).await,
            Backend::Mysql(p) => create_admin_mysql(p, admin).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let sql = format!("{} WHERE email = ?", SELECT_ADMIN);
        match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get admin by email")?;
                row.map(|r| row_to_admin_sqlite(&r)).transpose()
            }
            Backend::Mysql(p) => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get admin by email")?;
                row.map(|r| row_to_admin_mysql(&r)).transpose()
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>> {
        let sql = format!("{} WHERE id = ?", SELECT_ADMIN);
        match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get admin by ID")?;
                row.map(|r| row_to_admin_sqlite(&r)).transpose()
            }
            Backend::Mysql(p) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get admin by ID")?;
                row.map(|r| row_to_admin_mysql(&r)).transpose()
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM admins";
        let count = match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => sqlx::query(sql).fetch_one(p).await?.get("count"),
            Backend::Mysql(p) => sqlx::query(sql).fetch_one(p).await?.get("count"),
        };
        Ok(count)
    }
}

const INSERT_ADMIN: &str = r#"
    INSERT INTO admins (email, password_hash, created_at)
    VALUES (?, ?, ?)
"#;

async fn create_admin_sqlite(pool: &SqlitePool, admin: &Admin) -> Result<Admin> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_ADMIN)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create admin")?;

    Ok(Admin {
        id: result.last_insert_rowid(),
        created_at: now,
        ..admin.clone()
    })
}

async fn create_admin_mysql(pool: &MySqlPool, admin: &Admin) -> Result<Admin> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_ADMIN)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create admin")?;

    Ok(Admin {
        id: result.last_insert_id() as i64,
        created_at: now,
        ..admin.clone()
    })
}

fn row_to_admin_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Admin> {
    Ok(Admin {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_admin_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Admin> {
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(Admin {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at,
    })
}
