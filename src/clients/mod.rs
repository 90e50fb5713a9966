//! Adapters for the two web services and the photo bucket.
//!
//! The sync engine only talks to these traits:
//! - `SourceService`: Transparent Classroom (`ClassroomClient`)
//! - `DestinationJournal`: one Tinybeans journal (`TinybeansJournal`)
//! - `PhotoCopier`: download a photo and upload it for the journal
//!   (`DownloadThenUpload`)

pub mod classroom;
pub mod media;
pub mod tinybeans;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Entry, EntryForCreate, Journal, Post, SourceChild};

pub use classroom::ClassroomClient;
pub use media::DownloadThenUpload;
#[cfg(feature = "s3")]
pub use media::S3Uploader;
pub use tinybeans::{JournalSelector, TinybeansClient, TinybeansJournal};

/// Read-only view of the source service.
#[async_trait]
pub trait SourceService: Send + Sync {
    /// Children belonging to the logged-in parent.
    async fn my_children(&self) -> Result<Vec<SourceChild>>;

    /// Posts with the given ids. Unknown ids are simply absent.
    async fn posts_by_id(&self, ids: &[u64]) -> Result<Vec<Post>>;

    /// One page (1-based) of all posts, newest first.
    async fn posts_page(&self, page: usize) -> Result<Vec<Post>>;

    /// Number of posts in a full page; a shorter page is the last.
    fn posts_per_page(&self) -> usize;
}

/// One destination journal.
#[async_trait]
pub trait DestinationJournal: Send + Sync {
    /// Journal title and roster.
    async fn details(&self) -> Result<Journal>;

    /// Full-text search over entry captions.
    async fn search(&self, term: &str) -> Result<Vec<Entry>>;

    /// Entries for a month, or for one day in the server's cover order.
    async fn entries(&self, year: i32, month: u32, day: Option<u32>) -> Result<Vec<Entry>>;

    async fn create_entry(&self, entry: &EntryForCreate) -> Result<Entry>;

    /// Pin an entry, resubmitting its other fields unchanged.
    async fn pin_entry(&self, entry: &Entry) -> Result<()>;
}

/// Copies a photo from a URL into the journal's media store.
#[async_trait]
pub trait PhotoCopier: Send + Sync {
    /// Returns the remote file name to reference from a new entry.
    async fn copy_photo(&self, url: &str) -> Result<String>;
}

/// Stores a local file where new entries can reference it.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Returns the remote file name.
    async fn upload_file(&self, path: &Path, suffix: &str) -> Result<String>;
}
