// src/models/mod.rs

//! Domain models for the sync engine.
//!
//! This module contains the data structures of both services and the
//! run-scoped types that tie them together.

mod child;
mod config;
mod entry;
mod post;

// Re-export all public types
pub use child::ChildIdentity;
pub use config::{
    ClassroomConfig, Config, Credentials, HttpConfig, SyncConfig, TinybeansConfig, UploadConfig,
};
pub use entry::{Entry, EntryChild, EntryForCreate, EntryForUpdate, Journal, JournalChild};
pub use post::{Post, PostRef, SourceChild, UserInfo};

/// Marker prefix carried by every caption this tool writes.
pub const SESSION_MARKER_PREFIX: &str = "tctbimport.";

/// Identifies one import run in the captions it writes.
///
/// Supplied by the caller; used for auditing, never for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSession {
    id: String,
}

impl ImportSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// A short random session id: six lowercase hex characters.
    pub fn random() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self::new(&hex[..6])
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `tctbimport.<session id>`
    pub fn marker(&self) -> String {
        format!("{SESSION_MARKER_PREFIX}{}", self.id)
    }
}

/// `post.<id>`, the token that makes an import findable again.
pub fn post_marker(post_id: u64) -> String {
    format!("post.{post_id}")
}
