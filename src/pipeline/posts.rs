// src/pipeline/posts.rs

//! Walking the source's post listing.

use std::collections::VecDeque;

use chrono::{DateTime, FixedOffset, NaiveDate};
use futures::future;
use futures::stream::{self, Stream, TryStreamExt};

use crate::clients::SourceService;
use crate::error::{AppError, Result};
use crate::models::Post;

/// Cursor over `posts.json` pages.
#[derive(Debug, Default)]
struct PageState {
    next_page: usize,
    buffer: VecDeque<Post>,
    exhausted: bool,
    previous: Option<(NaiveDate, DateTime<FixedOffset>)>,
}

/// Every post, newest first, fetching pages lazily.
///
/// The listing has no explicit end marker: a page shorter than a full page
/// is the last one. Posts must come ordered by `(date, created_at)`
/// descending; equal keys are allowed and seen in practice.
pub fn all_posts(source: &dyn SourceService) -> impl Stream<Item = Result<Post>> + '_ {
    let state = PageState {
        next_page: 1,
        ..PageState::default()
    };
    stream::try_unfold(state, move |state| next_post(source, state))
}

async fn next_post(
    source: &dyn SourceService,
    mut state: PageState,
) -> Result<Option<(Post, PageState)>> {
    loop {
        if let Some(post) = state.buffer.pop_front() {
            let key = (post.nominal_date()?, post.created_timestamp()?);
            if let Some(previous) = state.previous {
                if key > previous {
                    return Err(AppError::invariant(format!(
                        "post {} ({} {}) listed after a post dated {} {}",
                        post.id, key.0, key.1, previous.0, previous.1
                    )));
                }
            }
            state.previous = Some(key);
            return Ok(Some((post, state)));
        }

        if state.exhausted {
            return Ok(None);
        }

        let page = source.posts_page(state.next_page).await?;
        let full = source.posts_per_page();
        if page.len() > full {
            return Err(AppError::invariant(format!(
                "page {} has {} posts, expected no more than {}",
                state.next_page,
                page.len(),
                full
            )));
        }

        log::debug!("Fetched page {} with {} posts", state.next_page, page.len());
        state.exhausted = page.len() < full;
        state.next_page += 1;
        state.buffer.extend(page);
    }
}

/// Restrict a newest-first post stream to `since..=until`.
///
/// Stops pulling pages as soon as a post older than `since` shows up.
pub fn filter_by_date<'a, S>(
    posts: S,
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
) -> impl Stream<Item = Result<Post>> + 'a
where
    S: Stream<Item = Result<Post>> + 'a,
{
    posts
        .try_take_while(move |post| {
            future::ready(
                post.nominal_date()
                    .map(|date| since.is_none_or(|since| date >= since)),
            )
        })
        .try_filter_map(move |post| {
            let keep = post
                .nominal_date()
                .map(|date| until.is_none_or(|until| date <= until));
            future::ready(keep.map(|keep| keep.then_some(post)))
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::SourceChild;

    struct PagedSource {
        pages: Vec<Vec<Post>>,
        per_page: usize,
        requested: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl SourceService for PagedSource {
        async fn my_children(&self) -> Result<Vec<SourceChild>> {
            Ok(Vec::new())
        }
        async fn posts_by_id(&self, _: &[u64]) -> Result<Vec<Post>> {
            Ok(Vec::new())
        }
        async fn posts_page(&self, page: usize) -> Result<Vec<Post>> {
            self.requested.lock().unwrap().push(page);
            Ok(self.pages.get(page - 1).cloned().unwrap_or_default())
        }
        fn posts_per_page(&self) -> usize {
            self.per_page
        }
    }

    fn post(id: u64, date: &str, time: &str) -> Post {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "created_at": format!("{date}T{time}.000-08:00"),
            "date": date,
            "html": ""
        }))
        .unwrap()
    }

    fn source(pages: Vec<Vec<Post>>, per_page: usize) -> PagedSource {
        PagedSource {
            pages,
            per_page,
            requested: Mutex::new(Vec::new()),
        }
    }

    async fn ids(stream: impl Stream<Item = Result<Post>>) -> Result<Vec<u64>> {
        let posts: Vec<Post> = stream.try_collect().await?;
        Ok(posts.into_iter().map(|p| p.id).collect())
    }

    #[tokio::test]
    async fn test_walks_until_short_page() {
        let src = source(
            vec![
                vec![post(6, "2024-03-06", "10:00:00"), post(5, "2024-03-05", "12:00:00")],
                vec![post(4, "2024-03-05", "09:00:00"), post(3, "2024-03-04", "09:00:00")],
                vec![post(2, "2024-03-01", "09:00:00")],
            ],
            2,
        );
        assert_eq!(ids(all_posts(&src)).await.unwrap(), vec![6, 5, 4, 3, 2]);
        assert_eq!(*src.requested.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_full_last_page_needs_empty_page() {
        let src = source(vec![vec![post(2, "2024-03-02", "09:00:00")]], 1);
        assert_eq!(ids(all_posts(&src)).await.unwrap(), vec![2]);
        assert_eq!(*src.requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_out_of_order_listing_fails() {
        let src = source(
            vec![vec![post(1, "2024-03-01", "09:00:00"), post(2, "2024-03-02", "09:00:00")]],
            30,
        );
        let err = ids(all_posts(&src)).await.unwrap_err();
        assert!(matches!(err, AppError::Invariant(_)));
    }

    #[tokio::test]
    async fn test_oversized_page_fails() {
        let src = source(
            vec![vec![post(2, "2024-03-02", "09:00:00"), post(1, "2024-03-01", "09:00:00")]],
            1,
        );
        assert!(ids(all_posts(&src)).await.is_err());
    }

    #[tokio::test]
    async fn test_filter_inclusive_and_stops_early() {
        let src = source(
            vec![
                vec![post(9, "2024-03-10", "09:00:00"), post(8, "2024-03-08", "09:00:00")],
                vec![post(7, "2024-03-05", "09:00:00"), post(6, "2024-03-04", "09:00:00")],
                vec![post(5, "2024-03-01", "09:00:00"), post(4, "2024-02-28", "09:00:00")],
                vec![post(3, "2024-02-20", "09:00:00")],
            ],
            2,
        );
        let since = NaiveDate::from_ymd_opt(2024, 3, 4);
        let until = NaiveDate::from_ymd_opt(2024, 3, 8);

        let found = ids(filter_by_date(all_posts(&src), since, until)).await.unwrap();
        assert_eq!(found, vec![8, 7, 6]);
        // Page 3 holds the first post older than `since`; page 4 is never fetched.
        assert_eq!(*src.requested.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_filter_open_ended() {
        let src = source(vec![vec![post(2, "2024-03-02", "09:00:00"), post(1, "2024-03-01", "09:00:00")]], 30);
        let found = ids(filter_by_date(all_posts(&src), None, None)).await.unwrap();
        assert_eq!(found, vec![2, 1]);
    }
}
