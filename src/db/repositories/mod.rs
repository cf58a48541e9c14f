//! Database repositories
//!
//! Repository pattern implementations for database access, one per stored
//! entity kind.

pub mod admin;
pub mod content;
pub mod session;
pub mod singleton;

pub use admin::{AdminRepository, SqlxAdminRepository};
pub use content::{ContentRepository, SqlxContentRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use singleton::{SingletonRecord, SingletonRepository, SqlxSingletonRepository};
