use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};
use tracker_domain::filter::FilterMode;

pub const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// An environment value that was ignored while building the config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedVar {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// JSON snapshot backing the store. `None` keeps everything in memory.
    pub data_file: Option<PathBuf>,
    pub default_filter: FilterMode,
    pub log_directive: String,
    /// Kept so they can be logged once a subscriber is installed.
    pub rejected: Vec<RejectedVar>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Malformed values
    /// keep the default and land in `rejected`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = lookup("TRACKER_DATA_FILE") {
            let path = path.trim();
            if !path.is_empty() {
                config.data_file = Some(PathBuf::from(path));
            }
        }
        if let Some(raw) = lookup("TRACKER_DEFAULT_FILTER") {
            match raw.parse::<FilterMode>() {
                Ok(mode) => config.default_filter = mode,
                Err(err) => config.rejected.push(RejectedVar {
                    key: "TRACKER_DEFAULT_FILTER",
                    value: raw,
                    reason: err.to_string(),
                }),
            }
        }
        if let Some(directive) = lookup("TRACKER_LOG") {
            let directive = directive.trim();
            if !directive.is_empty() {
                config.log_directive = directive.to_string();
            }
        }
        Ok(config)
    }

    /// Logs the effective settings and every ignored value.
    pub fn report(&self) {
        match &self.data_file {
            Some(path) => info!(path = %path.display(), "using snapshot file"),
            None => info!("no snapshot file, keeping trackers in memory"),
        }
        info!(filter = %self.default_filter, "default filter");
        for rejected in &self.rejected {
            warn!(
                key = rejected.key,
                value = %rejected.value,
                reason = %rejected.reason,
                "ignoring environment value"
            );
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            default_filter: FilterMode::AllTrackers,
            log_directive: DEFAULT_LOG_DIRECTIVE.to_string(),
            rejected: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TRACKER_DATA_FILE", "/tmp/trackers.json"),
            ("TRACKER_DEFAULT_FILTER", "incomplete"),
            ("TRACKER_LOG", "tracker_domain=debug"),
        ]))
        .unwrap();
        assert_eq!(config.data_file, Some(PathBuf::from("/tmp/trackers.json")));
        assert_eq!(config.default_filter, FilterMode::Incomplete);
        assert_eq!(config.log_directive, "tracker_domain=debug");
    }

    #[test]
    fn malformed_values_keep_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TRACKER_DATA_FILE", "  "),
            ("TRACKER_DEFAULT_FILTER", "someday"),
        ]))
        .unwrap();
        assert_eq!(config.data_file, None);
        assert_eq!(config.default_filter, FilterMode::AllTrackers);
        assert_eq!(config.rejected.len(), 1);
        assert_eq!(config.rejected[0].key, "TRACKER_DEFAULT_FILTER");
        assert_eq!(config.rejected[0].value, "someday");
        config.report();
    }
}
