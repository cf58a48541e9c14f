//! Singleton repository
//!
//! Storage for the cover page and editorial: tables holding at most one row,
//! read zero-or-one and written by upsert on the fixed id 1.

use crate::db::pool::{backend, Backend};
use crate::db::DynDatabasePool;
use crate::models::{ContentFields, SingletonSchema};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

const SINGLETON_ID: i64 = 1;

/// Stored values of a singleton record
#[derive(Debug, Clone, PartialEq)]
pub struct SingletonRecord {
    pub fields: ContentFields,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait SingletonRepository: Send + Sync {
    /// The record, if it was ever saved
    async fn get(&self, schema: &'static SingletonSchema) -> Result<Option<SingletonRecord>>;

    /// Insert the record or overwrite the existing one, stamping `updated_at`
    async fn upsert(
        &self,
        schema: &'static SingletonSchema,
        fields: &ContentFields,
    ) -> Result<SingletonRecord>;

    /// Number of rows in the table; 0 or 1 unless the table was edited by hand
    async fn count(&self, schema: &'static SingletonSchema) -> Result<i64>;
}

pub struct SqlxSingletonRepository {
    pool: DynDatabasePool,
}

impl SqlxSingletonRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SingletonRepository> {
        Arc::new(Self::new(pool))
    }
}

fn upsert_sqlite_sql(schema: &SingletonSchema) -> String {
    let updates = schema
        .fields
        .iter()
        .map(|f| format!("{0} = excluded.{0}", f.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} (id, {}, updated_at) VALUES ({}) ON CONFLICT(id) DO UPDATE SET {}, updated_at = excluded.updated_at",
        schema.table(),
        schema.column_list(),
        vec!["?"; schema.fields.len() + 2].join(", "),
        updates
    )
}

fn upsert_mysql_sql(schema: &SingletonSchema) -> String {
    let updates = schema
        .fields
        .iter()
        .map(|f| format!("{0} = VALUES({0})", f.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} (id, {}, updated_at) VALUES ({}) ON DUPLICATE KEY UPDATE {}, updated_at = VALUES(updated_at)",
        schema.table(),
        schema.column_list(),
        vec!["?"; schema.fields.len() + 2].join(", "),
        updates
    )
}

#[async_trait]
impl SingletonRepository for SqlxSingletonRepository {
    async fn get(&self, schema: &'static SingletonSchema) -> Result<Option<SingletonRecord>> {
        let sql = format!(
            "SELECT {}, updated_at FROM {} WHERE id = ?",
            schema.column_list(),
            schema.table()
        );

        let record = match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => {
                let row = sqlx::query(&sql)
                    .bind(SINGLETON_ID)
                    .fetch_optional(p)
                    .await
                    .with_context(|| format!("Failed to get {}", schema.key))?;
                match row {
                    Some(row) => {
                        let mut fields = ContentFields::new();
                        for spec in schema.fields {
                            fields.insert(spec.name.to_string(), row.try_get(spec.name)?);
                        }
                        Some(SingletonRecord {
                            fields,
                            updated_at: row.try_get("updated_at")?,
                        })
                    }
                    None => None,
                }
            }
            Backend::Mysql(p) => {
                let row = sqlx::query(&sql)
                    .bind(SINGLETON_ID)
                    .fetch_optional(p)
                    .await
                    .with_context(|| format!("Failed to get {}", schema.key))?;
                match row {
                    Some(row) => {
                        let mut fields = ContentFields::new();
                        for spec in schema.fields {
                            fields.insert(spec.name.to_string(), row.try_get(spec.name)?);
                        }
                        Some(SingletonRecord {
                            fields,
                            updated_at: row.try_get("updated_at")?,
                        })
                    }
                    None => None,
                }
            }
        };

        Ok(record)
    }

    async fn upsert(
        &self,
        schema: &'static SingletonSchema,
        fields: &ContentFields,
    ) -> Result<SingletonRecord> {
        let now = Utc::now();
        let values: Vec<&str> = schema
            .fields
            .iter()
            .map(|f| fields.get(f.name).map(String::as_str).unwrap_or(""))
            .collect();

        match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => {
                let sql = upsert_sqlite_sql(schema);
                let mut query = sqlx::query(&sql).bind(SINGLETON_ID);
                for value in &values {
                    query = query.bind(*value);
                }
                query
                    .bind(now)
                    .execute(p)
                    .await
                    .with_context(|| format!("Failed to save {}", schema.key))?;
            }
            Backend::Mysql(p) => {
                let sql = upsert_mysql_sql(schema);
                let mut query = sqlx::query(&sql).bind(SINGLETON_ID);
                for value in &values {
                    query = query.bind(*value);
                }
                query
                    .bind(now)
                    .execute(p)
                    .await
                    .with_context(|| format!("Failed to save {}", schema.key))?;
            }
        }

        self.get(schema)
            .await?
            .with_context(|| format!("Saved {} not found", schema.key))
    }

    async fn count(&self, schema: &'static SingletonSchema) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) AS count FROM {}", schema.table());
        let count = match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => sqlx::query(&sql).fetch_one(p).await?.get("count"),
            Backend::Mysql(p) => sqlx::query(&sql).fetch_one(p).await?.get("count"),
        };
        Ok(count)
    }
}
