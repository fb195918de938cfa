use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracker_domain::schedule::{Clock, SystemClock};
use tracker_domain::{MemoryStore, TrackerService};

use crate::analytics::AnalyticsSink;
use crate::categories::CategoryViewModel;
use crate::config::AppConfig;
use crate::screen::TrackersScreen;
use crate::storage::StorageFile;

/// Wires config, the snapshot file and the service together.
pub struct Session {
    config: AppConfig,
    store: Arc<MemoryStore>,
    service: Arc<TrackerService>,
    onboarding_completed: bool,
}

impl Session {
    pub fn start(config: AppConfig) -> Result<Self> {
        Self::start_with_clock(config, Arc::new(SystemClock))
    }

    pub fn start_with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let file = match &config.data_file {
            Some(path) => StorageFile::load(path)?,
            None => StorageFile::default(),
        };
        let store = Arc::new(MemoryStore::from_snapshot(&file.snapshot));
        let service = TrackerService::builder(store.clone())
            .with_clock(clock)
            .with_filter_mode(config.default_filter)
            .build()
            .context("failed to build tracker service")?;
        info!(
            trackers = service.trackers().len(),
            filter = %config.default_filter,
            "session started"
        );
        Ok(Self {
            config,
            store,
            service: Arc::new(service),
            onboarding_completed: file.onboarding_completed,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn service(&self) -> Arc<TrackerService> {
        self.service.clone()
    }

    pub fn trackers_screen(&self, analytics: Arc<dyn AnalyticsSink>) -> TrackersScreen {
        TrackersScreen::new(self.service.clone(), analytics)
    }

    pub fn category_picker(&self, selected: Option<String>) -> CategoryViewModel {
        CategoryViewModel::new(self.service.clone(), selected)
    }

    pub fn onboarding_completed(&self) -> bool {
        self.onboarding_completed
    }

    pub fn complete_onboarding(&mut self) {
        self.onboarding_completed = true;
    }

    /// Writes the store back to the configured file. A no-op for in-memory sessions.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.config.data_file else {
            return Ok(());
        };
        StorageFile {
            snapshot: self.store.snapshot(),
            onboarding_completed: self.onboarding_completed,
        }
        .save(path)
    }
}
