// src/services/matcher.rs

//! Pairs source children with journal children by name.

use crate::error::{AppError, Result};
use crate::models::{ChildIdentity, JournalChild, SourceChild};

/// Match the two rosters on exact first and last name.
///
/// Comparison is case-sensitive and uses the names as each API returns
/// them. Disjoint rosters give an empty list. A source child whose name
/// appears on more than one journal child is an error: picking one would
/// tag posts onto an arbitrary child.
pub fn find_matching_children(
    source_children: &[SourceChild],
    journal_children: &[JournalChild],
) -> Result<Vec<ChildIdentity>> {
    let mut matches = Vec::new();

    for source in source_children {
        let mut found = journal_children
            .iter()
            .filter(|j| j.first_name == source.first_name && j.last_name == source.last_name);

        let Some(journal) = found.next() else {
            log::debug!(
                "No journal child named {} {} (source id {})",
                source.first_name,
                source.last_name,
                source.id
            );
            continue;
        };

        if let Some(other) = found.next() {
            return Err(AppError::invariant(format!(
                "{} {} matches journal children {} and {}",
                source.first_name, source.last_name, journal.id, other.id
            )));
        }

        matches.push(ChildIdentity {
            first_name: journal.first_name.clone(),
            last_name: journal.last_name.clone(),
            source_id: source.id,
            destination_id: journal.id,
        });
    }

    Ok(matches)
}
