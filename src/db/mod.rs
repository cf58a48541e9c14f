//! Database layer
//!
//! SQLite (default) or MySQL, selected by configuration. Everything above
//! this module talks to a `DynDatabasePool` through the repositories.
//!
//! ```ignore
//! let pool = create_pool(&config.database).await?;
//! migrations::run_migrations(&pool).await?;
//! let content = SqlxContentRepository::boxed(pool.clone());
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
