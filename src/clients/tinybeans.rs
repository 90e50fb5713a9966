// src/clients/tinybeans.rs

//! Tinybeans client.
//!
//! Every response is wrapped in an envelope with a `status` field; anything
//! other than `"ok"` is reported as a remote error even on HTTP 200.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::clients::DestinationJournal;
use crate::error::{AppError, Result};
use crate::models::{Credentials, Entry, EntryForCreate, EntryForUpdate, Journal, TinybeansConfig};

const SERVICE: &str = "tinybeans";

/// Check a response's `status`, then decode the rest of it.
///
/// Failed responses rarely carry the usual body, so the status is checked
/// before anything else is decoded.
fn open_envelope<T: DeserializeOwned>(body: Value) -> Result<T> {
    let status = body.get("status").and_then(Value::as_str).unwrap_or_default();
    if status != "ok" {
        let message = match body.get("message").and_then(Value::as_str) {
            Some(message) => format!("status '{status}': {message}"),
            None => format!("status '{status}'"),
        };
        return Err(AppError::remote(SERVICE, message));
    }
    Ok(serde_json::from_value(body)?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateBody {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct JournalsBody {
    journals: Vec<Journal>,
}

#[derive(Deserialize)]
struct JournalBody {
    journal: Journal,
}

#[derive(Deserialize)]
struct EntriesBody {
    #[serde(default)]
    entries: Option<Vec<Entry>>,
}

#[derive(Debug, Deserialize)]
struct EntryBody {
    entry: Entry,
}

/// How the operator picks a journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalSelector {
    Id(u64),
    Title(String),
}

impl FromStr for JournalSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<u64>() {
            Ok(id) => JournalSelector::Id(id),
            Err(_) => JournalSelector::Title(s.to_string()),
        })
    }
}

impl fmt::Display for JournalSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JournalSelector::Id(id) => write!(f, "#{id}"),
            JournalSelector::Title(title) => write!(f, "'{title}'"),
        }
    }
}

/// Pick a journal id out of the account's journals.
///
/// With no selector the first journal wins.
pub fn select_journal(journals: &[Journal], selector: Option<&JournalSelector>) -> Result<u64> {
    match selector {
        Some(JournalSelector::Id(id)) => Ok(*id),
        Some(JournalSelector::Title(title)) => journals
            .iter()
            .find(|j| &j.title == title)
            .map(|j| j.id)
            .ok_or_else(|| AppError::lookup(format!("no journal named '{title}'"))),
        None => journals
            .first()
            .map(|j| j.id)
            .ok_or_else(|| AppError::lookup("account has no journals")),
    }
}

/// Authenticated Tinybeans session.
#[derive(Clone)]
pub struct TinybeansClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl TinybeansClient {
    /// Authenticate and return a client carrying the access token.
    pub async fn login(
        client: Client,
        config: &TinybeansConfig,
        credentials: &Credentials,
    ) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        // Without the web app's client id the server answers "Unauthorised Client".
        let body: Value = client
            .post(format!("{base_url}/api/1/authenticate"))
            .json(&serde_json::json!({
                "username": credentials.username,
                "password": credentials.password,
                "clientId": config.client_id,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let access_token = open_envelope::<AuthenticateBody>(body)?.access_token;

        log::debug!("Logged in to Tinybeans as {}", credentials.username);

        Ok(Self {
            client,
            base_url,
            access_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("authorization", &self.access_token)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.request(self.client.get(format!("{}/api/1{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.request(self.client.post(format!("{}/api/1{}", self.base_url, path)))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body: Value = request.send().await?.error_for_status()?.json().await?;
        open_envelope(body)
    }

    /// All journals the account can see.
    pub async fn journals(&self) -> Result<Vec<Journal>> {
        let body: JournalsBody = self.send(self.get("/journals")).await?;
        Ok(body.journals)
    }

    /// Open one journal.
    pub async fn journal(&self, selector: Option<&JournalSelector>) -> Result<TinybeansJournal> {
        let journal_id = match selector {
            Some(JournalSelector::Id(id)) => *id,
            _ => select_journal(&self.journals().await?, selector)?,
        };
        log::debug!("Using Tinybeans journal {journal_id}");

        Ok(TinybeansJournal {
            client: self.clone(),
            journal_id,
        })
    }
}

/// One journal of an authenticated session.
#[derive(Clone)]
pub struct TinybeansJournal {
    client: TinybeansClient,
    journal_id: u64,
}

impl TinybeansJournal {
    pub fn id(&self) -> u64 {
        self.journal_id
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    fn path(&self, rest: &str) -> String {
        format!("/journals/{}{}", self.journal_id, rest)
    }
}

#[async_trait]
impl DestinationJournal for TinybeansJournal {
    async fn details(&self) -> Result<Journal> {
        let body: JournalBody = self.client.send(self.client.get(&self.path(""))).await?;
        Ok(body.journal)
    }

    async fn search(&self, term: &str) -> Result<Vec<Entry>> {
        // The web app asks for date-descending pages of 72.
        let request = self.client.get(&self.path("/search")).query(&[
            ("term", term),
            ("sort", "DD"),
            ("page", "1"),
            ("length", "72"),
        ]);
        let body: EntriesBody = self.client.send(request).await?;
        Ok(body.entries.unwrap_or_default())
    }

    async fn entries(&self, year: i32, month: u32, day: Option<u32>) -> Result<Vec<Entry>> {
        let mut query = vec![("year", year.to_string()), ("month", month.to_string())];
        if let Some(day) = day {
            query.push(("day", day.to_string()));
        }
        let request = self.client.get(&self.path("/entries")).query(&query);
        let body: EntriesBody = self.client.send(request).await?;
        Ok(body.entries.unwrap_or_default())
    }

    async fn create_entry(&self, entry: &EntryForCreate) -> Result<Entry> {
        let request = self.client.post(&self.path("/entries")).json(entry);
        let body: EntryBody = self.client.send(request).await?;
        Ok(body.entry)
    }

    async fn pin_entry(&self, entry: &Entry) -> Result<()> {
        let update = EntryForUpdate::pin(entry, Utc::now().timestamp_millis());
        let request = self
            .client
            .post(&self.path(&format!("/entries/{}", entry.id)))
            .json(&update);
        let _: serde_json::Value = self.client.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journals() -> Vec<Journal> {
        serde_json::from_value(serde_json::json!([
            {"id": 10, "title": "Family"},
            {"id": 20, "title": "Grandparents"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_selector_parse() {
        assert_eq!("42".parse::<JournalSelector>().unwrap(), JournalSelector::Id(42));
        assert_eq!(
            " Family ".parse::<JournalSelector>().unwrap(),
            JournalSelector::Title("Family".to_string())
        );
    }

    #[test]
    fn test_select_journal() {
        let journals = journals();
        assert_eq!(select_journal(&journals, None).unwrap(), 10);
        let by_title = JournalSelector::Title("Grandparents".to_string());
        assert_eq!(select_journal(&journals, Some(&by_title)).unwrap(), 20);
        assert_eq!(select_journal(&journals, Some(&JournalSelector::Id(99))).unwrap(), 99);
    }

    #[test]
    fn test_select_journal_unknown_title() {
        let missing = JournalSelector::Title("Nope".to_string());
        let err = select_journal(&journals(), Some(&missing)).unwrap_err();
        assert!(matches!(err, AppError::Lookup(_)));
        assert!(select_journal(&[], None).is_err());
    }

    #[test]
    fn test_envelope_status() {
        let ok: JournalsBody =
            open_envelope(serde_json::json!({"status": "ok", "journals": []})).unwrap();
        assert!(ok.journals.is_empty());

        let failed = open_envelope::<JournalsBody>(
            serde_json::json!({"status": "error", "message": "Unauthorised Client"}),
        )
        .unwrap_err();
        assert!(matches!(failed, AppError::Remote { .. }));
        assert!(failed.to_string().contains("Unauthorised Client"));
    }

    #[test]
    fn test_search_without_entries() {
        let body: EntriesBody =
            open_envelope(serde_json::json!({"status": "ok", "count": 0})).unwrap();
        assert!(body.entries.is_none());
    }

    #[test]
    fn test_malformed_body_keeps_decode_error() {
        let err = open_envelope::<EntryBody>(serde_json::json!({
            "status": "ok",
            "entry": {"id": 1, "year": 2024, "month": 3, "day": 5}
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Json(_)));
        assert!(err.to_string().contains("timestamp"));
    }
}
