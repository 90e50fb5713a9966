// src/services/importer.rs

//! Post importer.
//!
//! Decides, post by post, whether to copy a Transparent Classroom post into
//! the journal, and performs the copy.

use chrono::Datelike;

use crate::clients::{DestinationJournal, PhotoCopier, SourceService};
use crate::error::{AppError, Result};
use crate::models::{ChildIdentity, Entry, EntryForCreate, ImportSession, Post, PostRef, post_marker};
use crate::services::classifier::{class_post_confidence, tagged_child_ids};
use crate::services::cover::preserve_cover;
use crate::services::duplicates::find_existing_import;
use crate::utils::html::text_from_html;

/// Default score above which a post counts as a whole-class broadcast.
pub const DEFAULT_BROADCAST_THRESHOLD: usize = 3;

/// How the import of one post ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// A new journal entry was created.
    Imported(Entry),
    /// The journal already holds this post.
    AlreadyImported(Entry),
    /// Text-only post.
    NoPhoto,
    /// Looks like a post for the whole class.
    SuspectedBroadcast { score: usize },
}

impl ImportOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, ImportOutcome::Imported(_))
    }
}

/// Caption for an imported post: its text plus the markers.
pub fn build_caption(post: &Post, session: &ImportSession) -> String {
    format!(
        "{}\n\n({}, {})",
        text_from_html(&post.html),
        post_marker(post.id),
        session.marker()
    )
}

/// Copies posts into one journal for one run.
pub struct PostImporter<'a> {
    source: &'a dyn SourceService,
    journal: &'a dyn DestinationJournal,
    photos: &'a dyn PhotoCopier,
    children: &'a [ChildIdentity],
    session: ImportSession,
    broadcast_threshold: usize,
    journal_url: Option<String>,
}

impl<'a> PostImporter<'a> {
    pub fn new(
        source: &'a dyn SourceService,
        journal: &'a dyn DestinationJournal,
        photos: &'a dyn PhotoCopier,
        children: &'a [ChildIdentity],
        session: ImportSession,
    ) -> Self {
        Self {
            source,
            journal,
            photos,
            children,
            session,
            broadcast_threshold: DEFAULT_BROADCAST_THRESHOLD,
            journal_url: None,
        }
    }

    /// Posts scoring above `threshold` are skipped as broadcasts.
    pub fn with_broadcast_threshold(mut self, threshold: usize) -> Self {
        self.broadcast_threshold = threshold;
        self
    }

    /// Base URL used to log browsable links to entries.
    pub fn with_journal_url(mut self, base_url: impl Into<String>) -> Self {
        self.journal_url = Some(base_url.into());
        self
    }

    pub fn session(&self) -> &ImportSession {
        &self.session
    }

    fn describe(&self, entry: &Entry) -> String {
        match &self.journal_url {
            Some(base) => entry.web_url(base),
            None => format!("entry {}", entry.id),
        }
    }

    /// Import one post unless it was imported before or is not a candidate.
    pub async fn copy_post(&self, post: PostRef) -> Result<ImportOutcome> {
        let post_id = post.id();

        // Cheapest check first, and it only needs the id.
        if let Some(existing) = find_existing_import(self.journal, post_id).await? {
            log::info!(
                "Skipping post {post_id}, already imported: {}",
                self.describe(&existing)
            );
            return Ok(ImportOutcome::AlreadyImported(existing));
        }

        let post = self.resolve(post).await?;

        if !post.has_photo() {
            log::info!("Skipping post {post_id} with no picture");
            return Ok(ImportOutcome::NoPhoto);
        }

        let score = class_post_confidence(&post.html);
        if score > self.broadcast_threshold {
            log::info!("Skipping post {post_id}, suspected class post (score {score})");
            return Ok(ImportOutcome::SuspectedBroadcast { score });
        }

        let date = post.nominal_date()?;
        preserve_cover(self.journal, date).await?;

        let mut new_entry = EntryForCreate {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            caption: build_caption(&post, &self.session),
            ..Default::default()
        };

        match &post.original_photo_url {
            Some(url) => new_entry.remote_file_name = Some(self.photos.copy_photo(url).await?),
            None => log::warn!("Post {post_id} has a photo but no original; importing without it"),
        }

        new_entry.children = self.resolve_children(&post)?;

        let created = self.journal.create_entry(&new_entry).await?;
        log::info!("Imported post {post_id} as {}", self.describe(&created));
        Ok(ImportOutcome::Imported(created))
    }

    async fn resolve(&self, post: PostRef) -> Result<Post> {
        match post {
            PostRef::ByReference(post) => Ok(post),
            PostRef::ById(id) => self
                .source
                .posts_by_id(&[id])
                .await?
                .into_iter()
                .find(|p| p.id == id)
                .ok_or_else(|| AppError::lookup(format!("post {id} not found"))),
        }
    }

    /// Journal child ids for the known children tagged in the post.
    ///
    /// Every post we can see tags at least one of our children, so finding
    /// none means the roster match is incomplete.
    fn resolve_children(&self, post: &Post) -> Result<Vec<u64>> {
        let tagged = tagged_child_ids(&post.html)?;
        let ids: Vec<u64> = self
            .children
            .iter()
            .filter(|c| tagged.contains(&c.source_id))
            .map(|c| c.destination_id)
            .collect();

        if ids.is_empty() {
            return Err(AppError::matching(post.id, "couldn't match tagged child"));
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_ends_with_markers() {
        let post: Post = serde_json::from_value(serde_json::json!({
            "id": 901,
            "created_at": "2024-03-05T14:22:10.123-08:00",
            "date": "2024-03-05",
            "html": "<a class=\"child-link\" href=\"/s/1/children/7\">Ada</a> painted today"
        }))
        .unwrap();
        let caption = build_caption(&post, &ImportSession::new("abc123"));
        assert_eq!(caption, "Ada painted today\n\n(post.901, tctbimport.abc123)");
    }

    #[test]
    fn test_outcome_is_imported() {
        assert!(!ImportOutcome::NoPhoto.is_imported());
        assert!(!ImportOutcome::SuspectedBroadcast { score: 5 }.is_imported());
    }
}
