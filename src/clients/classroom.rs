// src/clients/classroom.rs

//! Transparent Classroom client.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::clients::SourceService;
use crate::error::{AppError, Result};
use crate::models::{ClassroomConfig, Credentials, Post, SourceChild, UserInfo};

static CHILD_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/s/\d+/children/(\d+)").expect("valid regex"));
static CLASSROOM_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/s/\d+/users\?classroom_id=(\d+)").expect("valid regex"));

const TOKEN_HEADER: &str = "X-TransparentClassroomToken";

/// Authenticated session against Transparent Classroom.
pub struct ClassroomClient {
    client: Client,
    base_url: String,
    posts_per_page: usize,
    user: UserInfo,
}

impl ClassroomClient {
    /// Authenticate and return a client carrying the API token.
    pub async fn login(
        client: Client,
        config: &ClassroomConfig,
        credentials: &Credentials,
    ) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let user: UserInfo = client
            .get(format!("{base_url}/api/v1/authenticate.json"))
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        log::debug!(
            "Logged in to Transparent Classroom as user {} (school {})",
            user.id,
            user.school_id
        );

        Ok(Self {
            client,
            base_url,
            posts_per_page: config.posts_per_page,
            user,
        })
    }

    pub fn user(&self) -> &UserInfo {
        &self.user
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header(TOKEN_HEADER, &self.user.api_token)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        Ok(request.send().await?.error_for_status()?.json().await?)
    }

    /// Full roster of one classroom.
    pub async fn children_in_classroom(&self, classroom_id: u64) -> Result<Vec<SourceChild>> {
        let path = format!(
            "/s/{}/classrooms/{}/children.json",
            self.user.school_id, classroom_id
        );
        self.get_json(self.get(&path)).await
    }

    fn validated(posts: Vec<Post>) -> Result<Vec<Post>> {
        for post in &posts {
            post.validate()?;
        }
        Ok(posts)
    }
}

/// Child and classroom ids linked from a user's profile page.
pub(crate) fn profile_links(page: &str) -> (BTreeSet<u64>, BTreeSet<u64>) {
    let ids = |re: &Regex| -> BTreeSet<u64> {
        re.captures_iter(page)
            .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
            .collect()
    };
    (ids(&CHILD_ID_REGEX), ids(&CLASSROOM_ID_REGEX))
}

#[async_trait]
impl SourceService for ClassroomClient {
    async fn my_children(&self) -> Result<Vec<SourceChild>> {
        // There is no JSON endpoint for "my children". The user's profile page
        // links to each of their children and to every classroom they can see.
        let path = format!("/s/{}/users/{}", self.user.school_id, self.user.id);
        let page = self
            .get(&path)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let (child_ids, classroom_ids) = profile_links(&page);

        let mut children = Vec::new();
        for classroom_id in classroom_ids {
            let roster = self.children_in_classroom(classroom_id).await?;
            children.extend(roster.into_iter().filter(|c| child_ids.contains(&c.id)));
        }

        if children.len() != child_ids.len() {
            return Err(AppError::invariant(format!(
                "profile links {} children but classroom rosters yielded {}",
                child_ids.len(),
                children.len()
            )));
        }

        Ok(children)
    }

    async fn posts_by_id(&self, ids: &[u64]) -> Result<Vec<Post>> {
        let path = format!("/s/{}/posts.json", self.user.school_id);
        let query: Vec<(&str, u64)> = ids.iter().map(|id| ("ids[]", *id)).collect();
        let posts = self.get_json(self.get(&path).query(&query)).await?;
        Self::validated(posts)
    }

    async fn posts_page(&self, page: usize) -> Result<Vec<Post>> {
        // `per_page` looks supported but any value makes the server return 500.
        let path = format!("/s/{}/posts.json", self.user.school_id);
        let posts = self.get_json(self.get(&path).query(&[("page", page)])).await?;
        Self::validated(posts)
    }

    fn posts_per_page(&self) -> usize {
        self.posts_per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_links() {
        let page = r#"
            <a href="/s/3/children/41">Ada</a>
            <a href="/s/3/children/41/posts">Ada's posts</a>
            <a href="/s/3/children/57">Grace</a>
            <a href="/s/3/users?classroom_id=8">Butterflies</a>
            <a href="/s/3/users?classroom_id=9">Caterpillars</a>
        "#;
        let (children, classrooms) = profile_links(page);
        assert_eq!(children.into_iter().collect::<Vec<_>>(), vec![41, 57]);
        assert_eq!(classrooms.into_iter().collect::<Vec<_>>(), vec![8, 9]);
    }

    #[test]
    fn test_profile_links_empty_page() {
        let (children, classrooms) = profile_links("<p>nothing here</p>");
        assert!(children.is_empty());
        assert!(classrooms.is_empty());
    }
}
