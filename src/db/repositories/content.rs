//! Section content repository
//!
//! One repository serves every collection section. Table and column names
//! come from the static `CollectionSchema` descriptors, never from request
//! data; only field values are bound as parameters.

use crate::db::pool::{backend, Backend};
use crate::db::DynDatabasePool;
use crate::models::{CollectionSchema, ContentFields, ContentItem};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Content repository trait
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// All items of a section, ordered by its sort column, newest first
    async fn list(&self, schema: &'static CollectionSchema) -> Result<Vec<ContentItem>>;

    async fn get_by_id(
        &self,
        schema: &'static CollectionSchema,
        id: i64,
    ) -> Result<Option<ContentItem>>;

    /// Insert a complete record; the store assigns id and timestamps
    async fn create(
        &self,
        schema: &'static CollectionSchema,
        fields: &ContentFields,
    ) -> Result<ContentItem>;

    /// Overwrite every schema field of the row with `id`.
    ///
    /// Returns `None` if no such row exists.
    async fn update(
        &self,
        schema: &'static CollectionSchema,
        id: i64,
        fields: &ContentFields,
    ) -> Result<Option<ContentItem>>;

    /// Returns whether a row was removed
    async fn delete(&self, schema: &'static CollectionSchema, id: i64) -> Result<bool>;

    async fn count(&self, schema: &'static CollectionSchema) -> Result<i64>;
}

/// SQLx-based content repository
pub struct SqlxContentRepository {
    pool: DynDatabasePool,
}

impl SqlxContentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContentRepository for SqlxContentRepository {
    async fn list(&self, schema: &'static CollectionSchema) -> Result<Vec<ContentItem>> {
        match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => list_sqlite(p, schema).await,
            Backend::Mysql(p) => list_mysql(p, schema).await,
        }
    }

    async fn get_by_id(
        &self,
        schema: &'static CollectionSchema,
        id: i64,
    ) -> Result<Option<ContentItem>> {
        match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => get_by_id_sqlite(p, schema, id).await,
            Backend::Mysql(p) => get_by_id_mysql(p, schema, id).await,
        }
    }

    async fn create(
        &self,
        schema: &'static CollectionSchema,
        fields: &ContentFields,
    ) -> Result<ContentItem> {
        match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => create_sqlite(p, schema, fields).await,
            Backend::Mysql(p) => create_mysql(p, schema, fields).await,
        }
    }

    async fn update(
        &self,
        schema: &'static CollectionSchema,
        id: i64,
        fields: &ContentFields,
    ) -> Result<Option<ContentItem>> {
        match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => update_sqlite(p, schema, id, fields).await,
            Backend::Mysql(p) => update_mysql(p, schema, id, fields).await,
        }
    }

    async fn delete(&self, schema: &'static CollectionSchema, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", schema.table());
        let affected = match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => sqlx::query(&sql).bind(id).execute(p).await?.rows_affected(),
            Backend::Mysql(p) => sqlx::query(&sql).bind(id).execute(p).await?.rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn count(&self, schema: &'static CollectionSchema) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) AS count FROM {}", schema.table());
        let count = match backend(self.pool.as_ref())? {
            Backend::Sqlite(p) => sqlx::query(&sql).fetch_one(p).await?.get("count"),
            Backend::Mysql(p) => sqlx::query(&sql).fetch_one(p).await?.get("count"),
        };
        Ok(count)
    }
}

fn select_sql(schema: &CollectionSchema) -> String {
    format!(
        "SELECT id, {}, created_at, updated_at FROM {}",
        schema.column_list(),
        schema.table()
    )
}

fn list_sql(schema: &CollectionSchema) -> String {
    format!("{} ORDER BY {} DESC, id DESC", select_sql(schema), schema.sort_by)
}

fn insert_sql(schema: &CollectionSchema) -> String {
    let placeholders = vec!["?"; schema.fields.len() + 2].join(", ");
    format!(
        "INSERT INTO {} ({}, created_at, updated_at) VALUES ({})",
        schema.table(),
        schema.column_list(),
        placeholders
    )
}

fn update_sql(schema: &CollectionSchema) -> String {
    let assignments = schema
        .fields
        .iter()
        .map(|f| format!("{} = ?", f.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("UPDATE {} SET {}, updated_at = ? WHERE id = ?", schema.table(), assignments)
}

/// Field values in schema order, empty for absent fields
fn ordered_values<'a>(schema: &CollectionSchema, fields: &'a ContentFields) -> Vec<&'a str> {
    schema
        .fields
        .iter()
        .map(|f| fields.get(f.name).map(String::as_str).unwrap_or(""))
        .collect()
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_sqlite(
    pool: &SqlitePool,
    schema: &'static CollectionSchema,
) -> Result<Vec<ContentItem>> {
    let rows = sqlx::query(&list_sql(schema))
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to list {}", schema.key))?;

    rows.iter().map(|row| row_to_item_sqlite(schema, row)).collect()
}

async fn get_by_id_sqlite(
    pool: &SqlitePool,
    schema: &'static CollectionSchema,
    id: i64,
) -> Result<Option<ContentItem>> {
    let sql = format!("{} WHERE id = ?", select_sql(schema));
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get {} item {}", schema.key, id))?;

    row.map(|row| row_to_item_sqlite(schema, &row)).transpose()
}

async fn create_sqlite(
    pool: &SqlitePool,
    schema: &'static CollectionSchema,
    fields: &ContentFields,
) -> Result<ContentItem> {
    let sql = insert_sql(schema);
    let now = Utc::now();
    let mut query = sqlx::query(&sql);
    for value in ordered_values(schema, fields) {
        query = query.bind(value);
    }
    let result = query
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create {} item", schema.key))?;

    let id = result.last_insert_rowid();
    get_by_id_sqlite(pool, schema, id)
        .await?
        .with_context(|| format!("Created {} item {} not found", schema.key, id))
}

async fn update_sqlite(
    pool: &SqlitePool,
    schema: &'static CollectionSchema,
    id: i64,
    fields: &ContentFields,
) -> Result<Option<ContentItem>> {
    let sql = update_sql(schema);
    let mut query = sqlx::query(&sql);
    for value in ordered_values(schema, fields) {
        query = query.bind(value);
    }
    let result = query
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update {} item {}", schema.key, id))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_by_id_sqlite(pool, schema, id).await
}

fn row_to_item_sqlite(
    schema: &CollectionSchema,
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ContentItem> {
    let mut fields = ContentFields::new();
    for spec in schema.fields {
        let value: String = row
            .try_get(spec.name)
            .with_context(|| format!("Failed to read {}.{}", schema.key, spec.name))?;
        fields.insert(spec.name.to_string(), value);
    }

    Ok(ContentItem {
        id: row.try_get("id")?,
        fields,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_mysql(
    pool: &MySqlPool,
    schema: &'static CollectionSchema,
) -> Result<Vec<ContentItem>> {
    let rows = sqlx::query(&list_sql(schema))
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to list {}", schema.key))?;

    rows.iter().map(|row| row_to_item_mysql(schema, row)).collect()
}

async fn get_by_id_mysql(
    pool: &MySqlPool,
    schema: &'static CollectionSchema,
    id: i64,
) -> Result<Option<ContentItem>> {
    let sql = format!("{} WHERE id = ?", select_sql(schema));
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get {} item {}", schema.key, id))?;

    row.map(|row| row_to_item_mysql(schema, &row)).transpose()
}

async fn create_mysql(
    pool: &MySqlPool,
    schema: &'static CollectionSchema,
    fields: &ContentFields,
) -> Result<ContentItem> {
    let sql = insert_sql(schema);
    let now = Utc::now();
    let mut query = sqlx::query(&sql);
    for value in ordered_values(schema, fields) {
        query = query.bind(value);
    }
    let result = query
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create {} item", schema.key))?;

    let id = result.last_insert_id() as i64;
    get_by_id_mysql(pool, schema, id)
        .await?
        .with_context(|| format!("Created {} item {} not found", schema.key, id))
}

async fn update_mysql(
    pool: &MySqlPool,
    schema: &'static CollectionSchema,
    id: i64,
    fields: &ContentFields,
) -> Result<Option<ContentItem>> {
    // MySQL reports zero affected rows when nothing changed, so check existence first
    if get_by_id_mysql(pool, schema, id).await?.is_none() {
        return Ok(None);
    }

    let sql = update_sql(schema);
    let mut query = sqlx::query(&sql);
    for value in ordered_values(schema, fields) {
        query = query.bind(value);
    }
    query
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update {} item {}", schema.key, id))?;

    get_by_id_mysql(pool, schema, id).await
}

fn row_to_item_mysql(
    schema: &CollectionSchema,
    row: &sqlx::mysql::MySqlRow,
) -> Result<ContentItem> {
    let mut fields = ContentFields::new();
    for spec in schema.fields {
        let value: String = row
            .try_get(spec.name)
            .with_context(|| format!("Failed to read {}.{}", schema.key, spec.name))?;
        fields.insert(spec.name.to_string(), value);
    }

    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(ContentItem {
        id: row.try_get("id")?,
        fields,
        created_at,
        updated_at,
    })
}
