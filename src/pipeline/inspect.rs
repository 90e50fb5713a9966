// src/pipeline/inspect.rs

//! Read-only views used by the diagnostic commands.

use std::collections::BTreeSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::clients::DestinationJournal;
use crate::error::Result;
use crate::models::{Entry, Post};
use crate::services::cover::{CoverReason, check_day_order, cover_entry};
use crate::services::{class_post_confidence, tagged_child_ids};
use crate::utils::html::text_from_html;

/// Graphemes kept by `short_caption` before the ellipsis.
pub const SHORT_CAPTION_LEN: usize = 50;

/// What the importer would see in a post.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub id: u64,
    pub date: String,
    pub has_photo: bool,
    pub tagged_children: BTreeSet<u64>,
    pub broadcast_score: usize,
    pub text: String,
}

impl PostSummary {
    pub fn from_post(post: &Post) -> Result<Self> {
        Ok(Self {
            id: post.id,
            date: post.date.clone(),
            has_photo: post.has_photo(),
            tagged_children: tagged_child_ids(&post.html)?,
            broadcast_score: class_post_confidence(&post.html),
            text: text_from_html(&post.html),
        })
    }
}

/// A listing of journal entries, with the cover marked when the listing is one day.
#[derive(Debug, Clone)]
pub struct EntryListing {
    pub entries: Vec<Entry>,
    pub cover: Option<(usize, CoverReason)>,
}

/// Fetch a month, or one day, of entries.
///
/// A single day is checked against the order the cover logic relies on.
pub async fn list_entries(
    journal: &dyn DestinationJournal,
    year: i32,
    month: u32,
    day: Option<u32>,
) -> Result<EntryListing> {
    let entries = journal.entries(year, month, day).await?;
    let cover = match day {
        Some(_) => {
            check_day_order(&entries)?;
            cover_entry(&entries).map(|(index, _, reason)| (index, reason))
        }
        None => None,
    };
    Ok(EntryListing { entries, cover })
}

/// One-line caption preview, cut on grapheme boundaries.
pub fn short_caption(caption: &str) -> String {
    let flat = caption.replace(['\r', '\n'], " ");
    let mut graphemes = flat.graphemes(true);
    let head: String = graphemes.by_ref().take(SHORT_CAPTION_LEN).collect();
    if graphemes.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
