//! kidsync CLI
//!
//! Copies photo posts from Transparent Classroom into a Tinybeans journal.

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use kidsync::{
    clients::{
        ClassroomClient, DestinationJournal, DownloadThenUpload, JournalSelector, S3Uploader,
        SourceService, TinybeansClient, TinybeansJournal,
    },
    error::Result,
    models::{Config, Credentials, ImportSession, Post},
    pipeline::{
        self, SyncReport,
        inspect::{PostSummary, list_entries, short_caption},
    },
    services::PostImporter,
    utils::http,
};

/// kidsync - Transparent Classroom to Tinybeans
#[derive(Parser, Debug)]
#[command(
    name = "kidsync",
    version,
    about = "Copy photo posts from Transparent Classroom into Tinybeans"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "kidsync.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy the given posts
    CopyPostsById {
        /// Journal id or title
        #[arg(long)]
        journal: Option<JournalSelector>,

        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Copy every post dated within a range (inclusive)
    CopyPostsInRange {
        #[arg(long)]
        since: NaiveDate,

        #[arg(long)]
        until: NaiveDate,

        /// Journal id or title
        #[arg(long)]
        journal: Option<JournalSelector>,
    },

    /// Show children found in both services
    ShowMatchingChildren {
        /// Journal id or title
        #[arg(long)]
        journal: Option<JournalSelector>,
    },

    /// List the journals of the Tinybeans account
    ListJournals,

    /// Show a month or day of journal entries
    Entries {
        /// Journal id or title
        #[arg(long)]
        journal: Option<JournalSelector>,

        /// YYYY-MM or YYYY-MM-DD
        date: EntryDate,
    },

    /// Search journal captions
    Search {
        /// Journal id or title
        #[arg(long)]
        journal: Option<JournalSelector>,

        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Show how posts would be classified
    Posts {
        #[arg(long)]
        since: Option<NaiveDate>,

        #[arg(long)]
        until: Option<NaiveDate>,

        /// Specific posts; all posts in range when empty
        ids: Vec<u64>,
    },
}

/// A month, or one day of it.
#[derive(Debug, Clone, Copy)]
struct EntryDate {
    year: i32,
    month: u32,
    day: Option<u32>,
}

impl FromStr for EntryDate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self {
                year: date.year(),
                month: date.month(),
                day: Some(date.day()),
            });
        }

        let invalid = || format!("expected YYYY-MM or YYYY-MM-DD, got '{s}'");
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self {
            year,
            month,
            day: None,
        })
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Services and settings shared by the commands.
struct App {
    config: Config,
    client: reqwest::Client,
}

impl App {
    async fn classroom(&self) -> Result<ClassroomClient> {
        ClassroomClient::login(
            self.client.clone(),
            &self.config.classroom,
            &Credentials::classroom()?,
        )
        .await
    }

    async fn tinybeans(&self) -> Result<TinybeansClient> {
        TinybeansClient::login(
            self.client.clone(),
            &self.config.tinybeans,
            &Credentials::tinybeans()?,
        )
        .await
    }

    async fn journal(&self, selector: Option<JournalSelector>) -> Result<TinybeansJournal> {
        let selector = selector.or_else(|| {
            self.config
                .default_journal()
                .and_then(|s| s.parse::<JournalSelector>().ok())
        });
        self.tinybeans().await?.journal(selector.as_ref()).await
    }

    async fn photo_copier(&self) -> Result<DownloadThenUpload<S3Uploader>> {
        let uploader = S3Uploader::from_config(&self.config.upload).await?;
        Ok(DownloadThenUpload::new(self.client.clone(), uploader))
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;
    log::debug!("Loaded configuration from {}", cli.config.display());

    let client = http::create_client(&config.http)?;
    let app = App { config, client };

    match cli.command {
        Command::CopyPostsById { journal, ids } => {
            let source = app.classroom().await?;
            let journal = app.journal(journal).await?;
            let photos = app.photo_copier().await?;
            let children = pipeline::matching_children(&source, &journal).await?;

            let session = ImportSession::random();
            println!("Import session: {}", session.id());

            let importer = PostImporter::new(&source, &journal, &photos, &children, session)
                .with_broadcast_threshold(app.config.sync.broadcast_threshold)
                .with_journal_url(journal.base_url());
            let report = pipeline::run_copy_by_id(&importer, &ids).await?;
            return Ok(exit_code(&report));
        }

        Command::CopyPostsInRange {
            since,
            until,
            journal,
        } => {
            let source = app.classroom().await?;
            let journal = app.journal(journal).await?;
            let photos = app.photo_copier().await?;
            let children = pipeline::matching_children(&source, &journal).await?;

            let session = ImportSession::random();
            println!("Import session: {}", session.id());

            let importer = PostImporter::new(&source, &journal, &photos, &children, session)
                .with_broadcast_threshold(app.config.sync.broadcast_threshold)
                .with_journal_url(journal.base_url());
            let report = pipeline::run_copy_in_range(&importer, &source, since, until).await?;
            return Ok(exit_code(&report));
        }

        Command::ShowMatchingChildren { journal } => {
            let source = app.classroom().await?;
            let journal = app.journal(journal).await?;
            for child in pipeline::matching_children(&source, &journal).await? {
                println!("{}", child.summary_line());
            }
        }

        Command::ListJournals => {
            for journal in app.tinybeans().await?.journals().await? {
                println!("{}\t{}", journal.id, journal.title);
                for child in &journal.children {
                    println!("\t{}\t{} {}", child.id, child.first_name, child.last_name);
                }
            }
        }

        Command::Entries { journal, date } => {
            let journal = app.journal(journal).await?;
            let listing = list_entries(&journal, date.year, date.month, date.day).await?;

            for (index, entry) in listing.entries.iter().enumerate() {
                let marker = match listing.cover {
                    Some((cover, reason)) if cover == index => format!(" [cover: {reason:?}]"),
                    _ => String::new(),
                };
                println!(
                    "{:04}-{:02}-{:02}\t{}\t{}{}",
                    entry.year,
                    entry.month,
                    entry.day,
                    entry.web_url(journal.base_url()),
                    short_caption(&entry.caption),
                    marker
                );
            }
        }

        Command::Search { journal, terms } => {
            let journal = app.journal(journal).await?;
            let term = terms.join(" ");
            for entry in journal.search(&term).await? {
                println!(
                    "{}\t{}",
                    entry.web_url(journal.base_url()),
                    short_caption(&entry.caption)
                );
            }
        }

        Command::Posts { since, until, ids } => {
            let source = app.classroom().await?;
            let posts: Vec<Post> = if ids.is_empty() {
                pipeline::filter_by_date(pipeline::all_posts(&source), since, until)
                    .try_collect()
                    .await?
            } else {
                source.posts_by_id(&ids).await?
            };

            for post in &posts {
                print_post(post);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_post(post: &Post) {
    match PostSummary::from_post(post) {
        Ok(summary) => {
            println!(
                "post {} ({}) photo={} tagged={:?} score={}",
                summary.id,
                summary.date,
                summary.has_photo,
                summary.tagged_children,
                summary.broadcast_score
            );
            println!("{}\n", summary.text);
        }
        Err(e) => log::error!("Post {}: {}", post.id, e),
    }
}

fn exit_code(report: &SyncReport) -> ExitCode {
    if report.has_failures() {
        for (post_id, error) in &report.failures {
            log::error!("Failed post {post_id}: {error}");
        }
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
