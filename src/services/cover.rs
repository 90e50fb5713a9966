// src/services/cover.rs

//! Cover-photo preservation.
//!
//! Tinybeans shows one entry per day as the day's cover: the pinned entry
//! if there is one, otherwise whichever entry the server lists first. Adding
//! an entry can therefore silently change the cover. Pinning the current
//! cover before adding anything keeps it in place.

use chrono::{Datelike, NaiveDate};

use crate::clients::DestinationJournal;
use crate::error::{AppError, Result};
use crate::models::{Entry, SESSION_MARKER_PREFIX};

/// What `preserve_cover` did for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverAction {
    /// No entries yet; the new entry becomes the cover either way.
    EmptyDay,
    /// Some entry is already pinned.
    AlreadyPinned(u64),
    /// The cover is one of our own imports and is left unpinned.
    LeftImported(u64),
    /// The current cover was pinned.
    Pinned(u64),
}

/// Why an entry is the cover of its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverReason {
    Pinned,
    ServerOrder,
}

/// Sort key the server orders a day's entries by.
///
/// Ascending `sort_order` where present, otherwise newest first. A day may
/// mix entries with and without a sort order.
pub fn day_sort_key(entry: &Entry) -> (i64, i64) {
    (entry.sort_order.unwrap_or(-1), -entry.timestamp)
}

/// Check a day's entries arrive in the order we rely on to know the cover.
///
/// The order is observed, not documented. A failure here means the server
/// changed how it picks covers.
pub fn check_day_order(entries: &[Entry]) -> Result<()> {
    for (i, pair) in entries.windows(2).enumerate() {
        if day_sort_key(&pair[0]) > day_sort_key(&pair[1]) {
            return Err(AppError::invariant(format!(
                "day entries out of expected order at position {}: entry {} {:?} before entry {} {:?}",
                i,
                pair[0].id,
                day_sort_key(&pair[0]),
                pair[1].id,
                day_sort_key(&pair[1]),
            )));
        }
    }
    Ok(())
}

/// The entry shown as the day's cover, with its index.
///
/// With several pinned entries the most recently pinned one wins.
pub fn cover_entry(entries: &[Entry]) -> Option<(usize, &Entry, CoverReason)> {
    let pinned = entries
        .iter()
        .enumerate()
        .filter_map(|(i, e)| e.pinned_timestamp.map(|ts| (ts, i, e)))
        .fold(None, |best: Option<(i64, usize, &Entry)>, cur| match best {
            Some(b) if b.0 >= cur.0 => Some(b),
            _ => Some(cur),
        });

    if let Some((_, i, entry)) = pinned {
        return Some((i, entry, CoverReason::Pinned));
    }
    entries.first().map(|e| (0, e, CoverReason::ServerOrder))
}

/// Pin the current cover of `date` unless that would be pointless or wrong.
///
/// Must run before the new entry for that day is created. If the first
/// entry already carries an import-session marker it was written by this
/// tool, most likely earlier in the same run, and is left alone.
pub async fn preserve_cover(
    journal: &dyn DestinationJournal,
    date: NaiveDate,
) -> Result<CoverAction> {
    let entries = journal
        .entries(date.year(), date.month(), Some(date.day()))
        .await?;
    check_day_order(&entries)?;

    let Some(first) = entries.first() else {
        return Ok(CoverAction::EmptyDay);
    };

    if let Some(pinned) = entries.iter().find(|e| e.is_pinned()) {
        log::debug!("{date}: entry {} already pinned", pinned.id);
        return Ok(CoverAction::AlreadyPinned(pinned.id));
    }

    if first.caption.contains(SESSION_MARKER_PREFIX) {
        log::debug!("{date}: cover {} is an earlier import, not pinning", first.id);
        return Ok(CoverAction::LeftImported(first.id));
    }

    journal.pin_entry(first).await?;
    log::info!("{date}: pinned existing cover entry {}", first.id);
    Ok(CoverAction::Pinned(first.id))
}
