use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracker_domain::Snapshot;

/// On-disk layout: the store rows plus app-level flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageFile {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    #[serde(default)]
    pub onboarding_completed: bool,
}

impl StorageFile {
    /// A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no snapshot yet");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot `{}`", path.display()))?;
        let file: StorageFile = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse snapshot `{}`", path.display()))?;
        info!(
            path = %path.display(),
            trackers = file.snapshot.trackers.len(),
            records = file.snapshot.records.len(),
            "snapshot loaded"
        );
        Ok(file)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create `{}`", parent.display()))?;
            }
        }
        let text = serde_json::to_string_pretty(self).context("failed to encode snapshot")?;
        fs::write(path, text)
            .with_context(|| format!("failed to write snapshot `{}`", path.display()))?;
        debug!(path = %path.display(), "snapshot saved");
        Ok(())
    }
}
