//! Tinybeans data structures.
//!
//! Field names follow the JSON API, which is camelCase throughout.

use serde::{Deserialize, Serialize};

/// A child as listed in a journal's details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JournalChild {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,

    #[serde(default)]
    pub full_name: Option<String>,

    #[serde(default)]
    pub dob: Option<String>,
}

/// A journal and its roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    pub id: u64,
    pub title: String,

    #[serde(default)]
    pub children: Vec<JournalChild>,
}

/// Children on an entry.
///
/// A single fetched entry carries full child records; listings and search
/// results only carry `{childId}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum EntryChild {
    Full(JournalChild),
    #[serde(rename_all = "camelCase")]
    Ref { child_id: u64 },
}

impl EntryChild {
    pub fn id(&self) -> u64 {
        match self {
            EntryChild::Full(child) => child.id,
            EntryChild::Ref { child_id } => *child_id,
        }
    }
}

/// One journal entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: u64,

    #[serde(default)]
    pub uuid: String,

    /// Creation time, milliseconds since epoch
    pub timestamp: i64,

    #[serde(default)]
    pub pinned_timestamp: Option<i64>,

    #[serde(default)]
    pub sort_order: Option<i64>,

    pub year: i32,
    pub month: u32,
    pub day: u32,

    #[serde(default)]
    pub caption: String,

    /// Absent when no children are tagged
    #[serde(default)]
    pub children: Option<Vec<EntryChild>>,
}

impl Entry {
    pub fn is_pinned(&self) -> bool {
        self.pinned_timestamp.is_some()
    }

    /// Ids of the tagged children, whichever shape they arrived in.
    pub fn child_ids(&self) -> Vec<u64> {
        self.children
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(EntryChild::id)
            .collect()
    }

    /// Browsable link; the API's own `URL` field is not meant for people.
    pub fn web_url(&self, base_url: &str) -> String {
        format!(
            "{}/app/#/main/entries/{}/{}",
            base_url.trim_end_matches('/'),
            self.id,
            self.uuid
        )
    }
}

/// Body of an entry-create request.
///
/// The caller uploads any photo first and sets `remote_file_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntryForCreate {
    pub year: i32,
    pub month: u32,
    pub day: u32,

    pub caption: String,

    #[serde(default)]
    pub children: Vec<u64>,

    #[serde(default)]
    pub pets: Vec<u64>,

    /// Absent for text-only entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_file_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_mode: Option<bool>,
}

/// Body of an entry-update request; every field is resubmitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntryForUpdate {
    pub year: i32,
    pub month: u32,
    pub day: u32,

    pub caption: String,

    /// Milliseconds since epoch
    pub pinned_timestamp: i64,

    pub children: Vec<u64>,
}

impl EntryForUpdate {
    /// Update that pins `entry` at `pinned_timestamp`.
    pub fn pin(entry: &Entry, pinned_timestamp: i64) -> Self {
        Self {
            year: entry.year,
            month: entry.month,
            day: entry.day,
            caption: entry.caption.clone(),
            pinned_timestamp,
            children: entry.child_ids(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_children_both_shapes() {
        let listed: Entry = serde_json::from_value(serde_json::json!({
            "id": 1, "uuid": "u-1", "timestamp": 1000, "year": 2024, "month": 3,
            "day": 5, "caption": "hi", "children": [{"childId": 77}],
            "URL": "https://tinybeans.com/api/1/entries/1", "type": "PHOTO"
        }))
        .unwrap();
        assert_eq!(listed.child_ids(), vec![77]);

        let full: Entry = serde_json::from_value(serde_json::json!({
            "id": 2, "uuid": "u-2", "timestamp": 1000, "year": 2024, "month": 3,
            "day": 5, "caption": "hi",
            "children": [{"id": 78, "firstName": "Ada", "lastName": "Lovelace"}]
        }))
        .unwrap();
        assert_eq!(full.child_ids(), vec![78]);
    }

    #[test]
    fn test_entry_without_children() {
        let entry: Entry = serde_json::from_value(serde_json::json!({
            "id": 3, "timestamp": 5, "year": 2024, "month": 1, "day": 2,
            "caption": "", "pinnedTimestamp": 99
        }))
        .unwrap();
        assert!(entry.child_ids().is_empty());
        assert!(entry.is_pinned());
    }

    #[test]
    fn test_create_body_omits_missing_photo() {
        let body = EntryForCreate {
            year: 2024,
            month: 3,
            day: 5,
            caption: "x".to_string(),
            children: vec![4],
            ..Default::default()
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("remoteFileName").is_none());
        assert_eq!(json["children"], serde_json::json!([4]));
    }

    #[test]
    fn test_pin_update_copies_fields() {
        let entry = Entry {
            id: 9,
            uuid: "u".to_string(),
            timestamp: 10,
            pinned_timestamp: None,
            sort_order: None,
            year: 2024,
            month: 6,
            day: 1,
            caption: "beach".to_string(),
            children: Some(vec![EntryChild::Ref { child_id: 3 }]),
        };
        let update = EntryForUpdate::pin(&entry, 1_700_000_000_000);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["pinnedTimestamp"], 1_700_000_000_000i64);
        assert_eq!(json["children"], serde_json::json!([3]));
        assert_eq!(json["caption"], "beach");
    }

    #[test]
    fn test_web_url() {
        let entry: Entry = serde_json::from_value(serde_json::json!({
            "id": 5, "uuid": "abc", "timestamp": 1, "year": 2024, "month": 1, "day": 1
        }))
        .unwrap();
        assert_eq!(
            entry.web_url("https://tinybeans.com/"),
            "https://tinybeans.com/app/#/main/entries/5/abc"
        );
    }
}
