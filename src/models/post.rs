//! Transparent Classroom data structures.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Response from `authenticate.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: u64,
    pub school_id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub api_token: String,
}

/// One child from `classrooms/<id>/children.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceChild {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,

    #[serde(default)]
    pub current_classroom_ids: Vec<u64>,
}

/// One post from `posts.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: u64,

    /// ISO 8601 creation timestamp
    pub created_at: String,

    /// Nominal date of the post, `YYYY-MM-DD`
    pub date: String,

    #[serde(default)]
    pub classroom_id: Option<u64>,

    #[serde(default)]
    pub author: Option<String>,

    pub html: String,

    #[serde(default)]
    pub normalized_text: Option<String>,

    // Missing for text-only posts
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub medium_photo_url: Option<String>,
    #[serde(default)]
    pub large_photo_url: Option<String>,
    #[serde(default)]
    pub original_photo_url: Option<String>,
}

impl Post {
    /// The post's nominal date.
    pub fn nominal_date(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").map_err(|e| {
            AppError::invariant(format!(
                "post {} has unparseable date '{}': {e}",
                self.id, self.date
            ))
        })
    }

    /// The post's creation timestamp.
    pub fn created_timestamp(&self) -> Result<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.created_at).map_err(|e| {
            AppError::invariant(format!(
                "post {} has unparseable created_at '{}': {e}",
                self.id, self.created_at
            ))
        })
    }

    /// Check both dates parse. Called on every decoded post.
    pub fn validate(&self) -> Result<()> {
        self.nominal_date()?;
        self.created_timestamp()?;
        Ok(())
    }

    /// Whether the post carries a photo at all.
    pub fn has_photo(&self) -> bool {
        self.photo_url.is_some()
    }
}

/// A post handed to the importer either in full or by id.
#[derive(Debug, Clone)]
pub enum PostRef {
    ByReference(Post),
    ById(u64),
}

impl PostRef {
    pub fn id(&self) -> u64 {
        match self {
            PostRef::ByReference(post) => post.id,
            PostRef::ById(id) => *id,
        }
    }
}

impl From<Post> for PostRef {
    fn from(post: Post) -> Self {
        PostRef::ByReference(post)
    }
}

impl From<u64> for PostRef {
    fn from(id: u64) -> Self {
        PostRef::ById(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        serde_json::from_value(serde_json::json!({
            "id": 901,
            "created_at": "2024-03-05T14:22:10.123-08:00",
            "classroom_id": 12,
            "author": "Ms. Rivera",
            "date": "2024-03-05",
            "html": "<a class=\"child-link\" href=\"/s/1/children/7\">Ada</a> painting",
            "normalized_text": "Ada painting",
            "photo_url": "https://cdn.example.com/p/901.jpg",
            "extra_field": true
        }))
        .unwrap()
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let post = sample_post();
        assert_eq!(post.id, 901);
        assert!(post.has_photo());
        assert!(post.original_photo_url.is_none());
    }

    #[test]
    fn test_dates_parse() {
        let post = sample_post();
        assert!(post.validate().is_ok());
        assert_eq!(
            post.nominal_date().unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn test_bad_date_is_invariant() {
        let mut post = sample_post();
        post.date = "03/05/2024".to_string();
        let err = post.validate().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_post_ref_id() {
        assert_eq!(PostRef::from(44u64).id(), 44);
        assert_eq!(PostRef::from(sample_post()).id(), 901);
    }
}
