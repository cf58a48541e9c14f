//! Data models
//!
//! Stored records (admins, sessions, section items, cover and editorial),
//! the static section schemas, and the reader's page list.

mod admin;
mod content;
mod front_matter;
mod magazine;
pub mod schema;
mod session;

pub use admin::{normalize_email, Admin, AdminSession};
pub use content::{ContentDraft, ContentItem};
pub use front_matter::{CoverPage, CoverPageInput, Editorial, EditorialInput};
pub use magazine::{table_of_contents, MagazinePage, PageCursor, PageEntry, PagePosition, PAGES};
pub use schema::{
    CollectionSchema, ContentFields, FieldKind, FieldSpec, SchemaError, Section, SingletonSchema,
};
pub use session::Session;
