//! Worker configuration and its defaults.

use serde::{Deserialize, Serialize};

use crate::WorkerError;

/// Current cache generation. Bump on every deploy to invalidate previously cached entries.
pub const DEFAULT_CACHE_NAME: &str = "qrscout-v4";
/// Same-origin paths fetched and cached at install time.
pub const DEFAULT_SEED_PATHS: [&str; 3] = ["/", "/index.html", "/manifest.json"];
/// Entry served when a live fetch fails.
pub const DEFAULT_OFFLINE_FALLBACK_PATH: &str = "/index.html";
/// Background-sync tag the page registers for queued submissions.
pub const SYNC_PENDING_DATA_TAG: &str = "sync-pending-data";
/// Development hosts the worker does not treat as external.
pub const DEFAULT_LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];
/// Static-pages hosting domains the worker does not treat as external.
pub const DEFAULT_PUBLIC_PAGES_DOMAINS: [&str; 1] = ["github.io"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Tunables for one worker deployment. Missing fields take the defaults above.
pub struct WorkerConfig {
    /// Name of the current cache generation.
    pub cache_name: String,
    /// Root-relative paths cached at install.
    pub seed_paths: Vec<String>,
    /// Root-relative path served when the network fails.
    pub offline_fallback_path: String,
    /// Background-sync tag that triggers the submission relay.
    pub sync_tag: String,
    /// Hostnames treated as local development hosts.
    pub local_hosts: Vec<String>,
    /// Hosting domains (matched with their subdomains) treated as first-party.
    pub public_pages_domains: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            seed_paths: DEFAULT_SEED_PATHS.iter().map(|p| p.to_string()).collect(),
            offline_fallback_path: DEFAULT_OFFLINE_FALLBACK_PATH.to_string(),
            sync_tag: SYNC_PENDING_DATA_TAG.to_string(),
            local_hosts: DEFAULT_LOCAL_HOSTS.iter().map(|h| h.to_string()).collect(),
            public_pages_domains: DEFAULT_PUBLIC_PAGES_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

impl WorkerConfig {
    /// Parses and validates a JSON config object.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Config`] for malformed JSON or invalid values.
    pub fn from_json(raw: &str) -> Result<Self, WorkerError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| WorkerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants the handlers rely on.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), WorkerError> {
        if self.cache_name.trim().is_empty() {
            return Err(WorkerError::Config("cache_name must not be empty".to_string()));
        }
        if self.sync_tag.trim().is_empty() {
            return Err(WorkerError::Config("sync_tag must not be empty".to_string()));
        }
        if !self.offline_fallback_path.starts_with('/') {
            return Err(WorkerError::Config(format!(
                "offline_fallback_path `{}` must start with `/`",
                self.offline_fallback_path
            )));
        }
        if let Some(path) = self.seed_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(WorkerError::Config(format!(
                "seed path `{path}` must start with `/`"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_deployed_constants() {
        let config = WorkerConfig::default();
        assert_eq!(config.cache_name, "qrscout-v4");
        assert_eq!(config.seed_paths, vec!["/", "/index.html", "/manifest.json"]);
        assert_eq!(config.offline_fallback_path, "/index.html");
        assert_eq!(config.sync_tag, "sync-pending-data");
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config = WorkerConfig::from_json(r#"{"cache_name":"qrscout-v2"}"#).expect("parse");
        assert_eq!(config.cache_name, "qrscout-v2");
        assert_eq!(config.sync_tag, SYNC_PENDING_DATA_TAG);
        assert_eq!(config.local_hosts, vec!["localhost", "127.0.0.1"]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            WorkerConfig::from_json(r#"{"cache_name":"  "}"#),
            Err(WorkerError::Config(_))
        ));
        assert!(matches!(
            WorkerConfig::from_json(r#"{"seed_paths":["index.html"]}"#),
            Err(WorkerError::Config(message)) if message.contains("index.html")
        ));
        assert!(matches!(
            WorkerConfig::from_json(r#"{"offline_fallback_path":"offline"}"#),
            Err(WorkerError::Config(_))
        ));
        assert!(matches!(
            WorkerConfig::from_json("not json"),
            Err(WorkerError::Config(_))
        ));
    }
}
