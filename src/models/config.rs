//! Application configuration structures.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client settings shared by both services
    #[serde(default)]
    pub http: HttpConfig,

    /// Transparent Classroom (source) settings
    #[serde(default)]
    pub classroom: ClassroomConfig,

    /// Tinybeans (destination) settings
    #[serde(default)]
    pub tinybeans: TinybeansConfig,

    /// Import decisions
    #[serde(default)]
    pub sync: SyncConfig,

    /// Photo upload bucket
    #[serde(default)]
    pub upload: UploadConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.classroom.base_url)
            .map_err(|e| AppError::validation(format!("classroom.base_url: {e}")))?;
        url::Url::parse(&self.tinybeans.base_url)
            .map_err(|e| AppError::validation(format!("tinybeans.base_url: {e}")))?;
        if self.classroom.posts_per_page == 0 {
            return Err(AppError::validation("classroom.posts_per_page must be > 0"));
        }
        if self.tinybeans.client_id.trim().is_empty() {
            return Err(AppError::validation("tinybeans.client_id is empty"));
        }
        if self.upload.bucket.trim().is_empty() {
            return Err(AppError::validation("upload.bucket is empty"));
        }
        // Pool ids are "<region>:<guid>"; a pool only works in its own region.
        if !self
            .upload
            .identity_pool
            .starts_with(&format!("{}:", self.upload.region))
        {
            return Err(AppError::validation(format!(
                "upload.identity_pool {} is not in region {}",
                self.upload.identity_pool, self.upload.region
            )));
        }
        Ok(())
    }

    /// Journal selector to use when none is given on the command line.
    ///
    /// `TINYBEANS_DEFAULT_JOURNAL` wins over the config file.
    pub fn default_journal(&self) -> Option<String> {
        env::var("TINYBEANS_DEFAULT_JOURNAL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.tinybeans.default_journal.clone())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Transparent Classroom settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomConfig {
    #[serde(default = "defaults::classroom_base_url")]
    pub base_url: String,

    /// Size of a full page from `posts.json`; a shorter page is the last one
    #[serde(default = "defaults::posts_per_page")]
    pub posts_per_page: usize,
}

impl Default for ClassroomConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::classroom_base_url(),
            posts_per_page: defaults::posts_per_page(),
        }
    }
}

/// Tinybeans settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TinybeansConfig {
    #[serde(default = "defaults::tinybeans_base_url")]
    pub base_url: String,

    /// Client id the web app sends on authentication
    #[serde(default = "defaults::client_id")]
    pub client_id: String,

    /// Journal title or id used when no `--journal` is given
    #[serde(default)]
    pub default_journal: Option<String>,
}

impl Default for TinybeansConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::tinybeans_base_url(),
            client_id: defaults::client_id(),
            default_journal: None,
        }
    }
}

/// Import decision settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Posts scoring above this are treated as whole-class broadcasts
    #[serde(default = "defaults::broadcast_threshold")]
    pub broadcast_threshold: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            broadcast_threshold: defaults::broadcast_threshold(),
        }
    }
}

/// Destination media bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "defaults::bucket")]
    pub bucket: String,

    #[serde(default = "defaults::region")]
    pub region: String,

    /// Cognito identity pool granting write access to the bucket
    #[serde(default = "defaults::identity_pool")]
    pub identity_pool: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            bucket: defaults::bucket(),
            region: defaults::region(),
            identity_pool: defaults::identity_pool(),
        }
    }
}

/// Username and password pair read from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Read credentials from the two named environment variables.
    pub fn from_env(username_var: &str, password_var: &str) -> Result<Self> {
        match (env::var(username_var), env::var(password_var)) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Ok(Self { username, password })
            }
            _ => Err(AppError::config(format!(
                "set {username_var} and {password_var}"
            ))),
        }
    }

    pub fn classroom() -> Result<Self> {
        Self::from_env(
            "TRANSPARENT_CLASSROOM_USERNAME",
            "TRANSPARENT_CLASSROOM_PASSWORD",
        )
    }

    pub fn tinybeans() -> Result<Self> {
        Self::from_env("TINYBEANS_USERNAME", "TINYBEANS_PASSWORD")
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; kidsync/0.1)".into()
    }
    pub fn timeout() -> u64 {
        60
    }

    // Source defaults
    pub fn classroom_base_url() -> String {
        "https://www.transparentclassroom.com".into()
    }
    pub fn posts_per_page() -> usize {
        30
    }

    // Destination defaults
    pub fn tinybeans_base_url() -> String {
        "https://tinybeans.com".into()
    }
    pub fn client_id() -> String {
        "d324d503-0127-4a85-a547-d9f2439ffeae".into()
    }

    // Sync defaults
    pub fn broadcast_threshold() -> usize {
        3
    }

    // Upload defaults
    pub fn bucket() -> String {
        "tinybeans-remote-upload-prod".into()
    }
    pub fn region() -> String {
        "us-east-1".into()
    }
    pub fn identity_pool() -> String {
        "us-east-1:bd2e63fa-d755-42c2-b14a-66ce0b9dad05".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.tinybeans.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_identity_pool_from_other_region() {
        let mut config = Config::default();
        config.upload.region = "eu-west-1".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("identity_pool"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sync]
            broadcast_threshold = 5

            [tinybeans]
            default_journal = "Family"
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.broadcast_threshold, 5);
        assert_eq!(config.tinybeans.default_journal.as_deref(), Some("Family"));
        assert_eq!(config.classroom.posts_per_page, 30);
        assert_eq!(config.upload.region, "us-east-1");
        assert!(config.upload.identity_pool.starts_with("us-east-1:"));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            username: "parent@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let shown = format!("{creds:?}");
        assert!(shown.contains("parent@example.com"));
        assert!(!shown.contains("hunter2"));
    }
}
