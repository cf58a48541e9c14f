//! classmag - a single-class magazine
//!
//! Readers page through the cover, editorial and ten content sections.
//! A password-gated admin edits every section through one schema-driven
//! editor.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
