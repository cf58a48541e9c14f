//! Services layer
//!
//! Business rules between the HTTP handlers and the repositories:
//! validation against section schemas, caching, and admin authentication.

pub mod auth;
pub mod content;
pub mod front_matter;
pub mod password;
pub mod rate_limiter;
pub mod reader;

pub use auth::{AuthService, AuthServiceError};
pub use content::{Confirmation, ContentService, ContentServiceError};
pub use front_matter::FrontMatterService;
pub use password::{hash_password, verify_password};
pub use rate_limiter::LoginRateLimiter;
pub use reader::{group_items, ItemGroup, PageContent, PageView, ReaderService};
