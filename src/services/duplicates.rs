// src/services/duplicates.rs

//! Detection of posts that were already imported.

use crate::clients::DestinationJournal;
use crate::error::{AppError, Result};
use crate::models::{Entry, post_marker};

/// Look up the journal entry created for `post_id`, if any.
///
/// Every import writes `post.<id>` into its caption, so a search for that
/// token finds it. Two or more hits mean the post was imported twice, which
/// the rest of the engine assumes never happens.
pub async fn find_existing_import(
    journal: &dyn DestinationJournal,
    post_id: u64,
) -> Result<Option<Entry>> {
    let marker = post_marker(post_id);
    let mut hits = journal.search(&marker).await?;

    match hits.len() {
        0 => Ok(None),
        1 => Ok(hits.pop()),
        n => Err(AppError::invariant(format!(
            "{n} journal entries carry {marker} (ids: {})",
            hits.iter()
                .map(|e| e.id.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}
