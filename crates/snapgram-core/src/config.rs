//! Client configuration
//!
//! Loaded from TOML. A missing file yields defaults; a file that exists but
//! cannot be read or parsed is an error. Every field has a default so partial
//! files are accepted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{BackendError, ConfigError};
use crate::types::MediaFile;

/// Upper bound on the request timeout.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;

/// Backend identifiers and client tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapgramConfig {
    /// Base URL of the hosted backend
    pub endpoint: String,
    /// Backend project
    pub project_id: String,
    /// Document database holding users and posts
    pub database_id: String,
    /// Bucket for uploaded media
    pub storage_id: String,
    /// User profile collection
    pub user_collection_id: String,
    /// Post collection
    pub post_collection_id: String,
    /// Page size of the recent posts feed
    pub recent_posts_limit: usize,
    /// Per-request timeout enforced by the collaborator layer
    pub request_timeout_secs: u64,
    /// Lower-case extensions, dot included
    pub accepted_media_extensions: Vec<String>,
    /// Where the local backend keeps its state and media
    pub data_dir: PathBuf,
}

impl Default for SnapgramConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost/v1".to_string(),
            project_id: "snapgram".to_string(),
            database_id: "snapgram-db".to_string(),
            storage_id: "media".to_string(),
            user_collection_id: "users".to_string(),
            post_collection_id: "posts".to_string(),
            recent_posts_limit: 20,
            request_timeout_secs: 30,
            accepted_media_extensions: [".png", ".jpeg", ".jpg", ".svg"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            data_dir: PathBuf::from(".snapgram"),
        }
    }
}

impl SnapgramConfig {
    /// Load from `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file missing, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject empty identifiers and out-of-range limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("endpoint", &self.endpoint),
            ("project_id", &self.project_id),
            ("database_id", &self.database_id),
            ("storage_id", &self.storage_id),
            ("user_collection_id", &self.user_collection_id),
            ("post_collection_id", &self.post_collection_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(field, "must not be empty"));
            }
        }

        if self.recent_posts_limit == 0 {
            return Err(ConfigError::invalid(
                "recent_posts_limit",
                "must be greater than 0",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "request_timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ConfigError::invalid(
                "request_timeout_secs",
                format!("cannot exceed {MAX_REQUEST_TIMEOUT_SECS} seconds"),
            ));
        }

        if self.accepted_media_extensions.is_empty() {
            return Err(ConfigError::invalid(
                "accepted_media_extensions",
                "at least one extension is required",
            ));
        }

        Ok(())
    }

    /// `request_timeout_secs` as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Upload policy derived from `accepted_media_extensions`.
    pub fn media_policy(&self) -> MediaPolicy {
        MediaPolicy {
            accepted_extensions: self
                .accepted_media_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
        }
    }
}

/// Which uploads the media collaborator accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPolicy {
    accepted_extensions: Vec<String>,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        SnapgramConfig::default().media_policy()
    }
}

impl MediaPolicy {
    /// Accept `file` only if its extension is allowed.
    pub fn check(&self, file: &MediaFile) -> Result<(), BackendError> {
        match file.extension() {
            Some(ext) if self.accepted_extensions.contains(&ext) => Ok(()),
            Some(ext) => Err(BackendError::media_rejected(format!(
                "{} has unsupported extension {ext}",
                file.file_name
            ))),
            None => Err(BackendError::media_rejected(format!(
                "{} has no extension",
                file.file_name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SnapgramConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, SnapgramConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "recent_posts_limit = 5").unwrap();
        writeln!(file, "endpoint = \"https://cloud.example.com/v1\"").unwrap();

        let config = SnapgramConfig::load(file.path()).unwrap();
        assert_eq!(config.recent_posts_limit, 5);
        assert_eq!(config.endpoint, "https://cloud.example.com/v1");
        assert_eq!(config.post_collection_id, "posts");
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "recent_posts_limit = \"many\"").unwrap();
        assert!(matches!(
            SnapgramConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let mut config = SnapgramConfig::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.request_timeout_secs = MAX_REQUEST_TIMEOUT_SECS + 1;
        assert!(config.validate().is_err());

        let mut config = SnapgramConfig::default();
        config.recent_posts_limit = 0;
        assert!(config.validate().is_err());

        let mut config = SnapgramConfig::default();
        config.project_id = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "project_id", .. })
        ));
    }

    #[test]
    fn media_policy_accepts_listed_extensions_only() {
        let policy = MediaPolicy::default();
        assert!(policy.check(&MediaFile::new("a.PNG", "image/png", vec![0])).is_ok());
        assert!(policy.check(&MediaFile::new("a.svg", "image/svg+xml", vec![0])).is_ok());
        assert!(policy.check(&MediaFile::new("a.gif", "image/gif", vec![0])).is_err());
        assert!(policy.check(&MediaFile::new("README", "text/plain", vec![0])).is_err());
    }
}
