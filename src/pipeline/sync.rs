// src/pipeline/sync.rs

//! Batch entry points for copying posts.

use chrono::NaiveDate;
use futures::TryStreamExt;

use crate::clients::{DestinationJournal, SourceService};
use crate::error::{AppError, Result};
use crate::models::{ChildIdentity, PostRef};
use crate::pipeline::posts::{all_posts, filter_by_date};
use crate::services::{ImportOutcome, PostImporter, find_matching_children};

/// Tally of a batch run.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub imported: usize,
    pub already_imported: usize,
    pub no_photo: usize,
    pub suspected_broadcast: usize,
    /// Posts that failed without stopping the batch
    pub failures: Vec<(u64, AppError)>,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.imported
            + self.already_imported
            + self.no_photo
            + self.suspected_broadcast
            + self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn record(&mut self, outcome: &ImportOutcome) {
        match outcome {
            ImportOutcome::Imported(_) => self.imported += 1,
            ImportOutcome::AlreadyImported(_) => self.already_imported += 1,
            ImportOutcome::NoPhoto => self.no_photo += 1,
            ImportOutcome::SuspectedBroadcast { .. } => self.suspected_broadcast += 1,
        }
    }
}

/// Children known to both services, freshly fetched.
pub async fn matching_children(
    source: &dyn SourceService,
    journal: &dyn DestinationJournal,
) -> Result<Vec<ChildIdentity>> {
    let source_children = source.my_children().await?;
    let journal = journal.details().await?;
    let matches = find_matching_children(&source_children, &journal.children)?;

    log::info!(
        "Matched {} of {} children against journal '{}'",
        matches.len(),
        source_children.len(),
        journal.title
    );
    Ok(matches)
}

/// Import one post, keeping the batch going on recoverable failures.
///
/// Lookup, match and transport failures are recorded and the batch moves
/// on; invariant and parse failures stop it.
async fn import_one(
    importer: &PostImporter<'_>,
    post: PostRef,
    report: &mut SyncReport,
) -> Result<()> {
    let post_id = post.id();
    match importer.copy_post(post).await {
        Ok(outcome) => {
            report.record(&outcome);
            Ok(())
        }
        Err(error) if error.is_fatal() => {
            log::error!("Post {post_id}: {error}");
            Err(error)
        }
        Err(error) => {
            log::error!("Post {post_id}: {error}");
            report.failures.push((post_id, error));
            Ok(())
        }
    }
}

/// Copy the given posts, in the order given.
pub async fn run_copy_by_id(importer: &PostImporter<'_>, post_ids: &[u64]) -> Result<SyncReport> {
    log::info!(
        "Copying {} posts (session {})",
        post_ids.len(),
        importer.session().id()
    );

    let mut report = SyncReport::default();
    for &post_id in post_ids {
        import_one(importer, PostRef::ById(post_id), &mut report).await?;
    }

    log_summary(&report);
    Ok(report)
}

/// Copy every post dated within `since..=until`, newest first.
pub async fn run_copy_in_range(
    importer: &PostImporter<'_>,
    source: &dyn SourceService,
    since: NaiveDate,
    until: NaiveDate,
) -> Result<SyncReport> {
    if since > until {
        return Err(AppError::validation(format!(
            "--since {since} is after --until {until}"
        )));
    }
    log::info!(
        "Copying posts from {since} to {until} (session {})",
        importer.session().id()
    );

    let mut report = SyncReport::default();
    let mut posts = std::pin::pin!(filter_by_date(all_posts(source), Some(since), Some(until)));
    while let Some(post) = posts.try_next().await? {
        import_one(importer, PostRef::ByReference(post), &mut report).await?;
    }

    log_summary(&report);
    Ok(report)
}

fn log_summary(report: &SyncReport) {
    log::info!(
        "{} posts: {} imported, {} already imported, {} without photo, {} class posts, {} failed",
        report.total(),
        report.imported,
        report.already_imported,
        report.no_photo,
        report.suspected_broadcast,
        report.failures.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = SyncReport::default();
        report.record(&ImportOutcome::NoPhoto);
        report.record(&ImportOutcome::SuspectedBroadcast { score: 6 });
        report.failures.push((3, AppError::lookup("post 3 not found")));

        assert_eq!(report.total(), 3);
        assert_eq!(report.no_photo, 1);
        assert_eq!(report.suspected_broadcast, 1);
        assert!(report.has_failures());
    }
}
