//! Service layer for the sync engine.
//!
//! This module contains the decision logic for:
//! - Roster matching (`find_matching_children`)
//! - Post classification (`tagged_child_ids`, `class_post_confidence`)
//! - Duplicate detection (`find_existing_import`)
//! - Cover preservation (`preserve_cover`)
//! - Importing (`PostImporter`)

pub mod classifier;
pub mod cover;
pub mod duplicates;
pub mod importer;
pub mod matcher;

pub use classifier::{class_post_confidence, tagged_child_ids};
pub use cover::{CoverAction, CoverReason, check_day_order, cover_entry, preserve_cover};
pub use duplicates::find_existing_import;
pub use importer::{ImportOutcome, PostImporter, build_caption};
pub use matcher::find_matching_children;
