//! Pipeline entry points for sync operations.
//!
//! - `run_copy_by_id`: Copy an explicit list of posts
//! - `run_copy_in_range`: Copy every post within a date range
//! - `inspect`: Read-only views behind the diagnostic commands

pub mod inspect;
pub mod posts;
pub mod sync;

pub use posts::{all_posts, filter_by_date};
pub use sync::{SyncReport, matching_children, run_copy_by_id, run_copy_in_range};
