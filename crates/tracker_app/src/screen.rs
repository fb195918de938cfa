use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};
use tracker_domain::completion::CompletionOutcome;
use tracker_domain::draft::TrackerDraft;
use tracker_domain::filter::FilterMode;
use tracker_domain::service::{EmptyState, VisibleSnapshot};
use tracker_domain::tracker::{Tracker, TrackerKind};
use tracker_domain::{TrackerError, TrackerService};
use uuid::Uuid;

use crate::analytics::{AnalyticsEvent, AnalyticsItem, AnalyticsSink, MAIN_SCREEN};

/// One tracker cell as the list shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerCard {
    pub tracker: Tracker,
    pub completed_days: usize,
    pub is_completed: bool,
    /// Whether tapping the button would be accepted for the shown date.
    pub can_toggle: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySection {
    pub title: String,
    pub cards: Vec<TrackerCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub mode: FilterMode,
    pub title: &'static str,
    /// Only narrowing modes show a checkmark.
    pub checked: bool,
}

/// View model of the main trackers list.
pub struct TrackersScreen {
    service: Arc<TrackerService>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl TrackersScreen {
    pub fn new(service: Arc<TrackerService>, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { service, analytics }
    }

    pub fn open(&self) -> VisibleSnapshot {
        self.analytics.report(&AnalyticsEvent::open(MAIN_SCREEN));
        self.service.snapshot()
    }

    pub fn close(&self) {
        self.analytics.report(&AnalyticsEvent::close(MAIN_SCREEN));
    }

    pub fn date(&self) -> NaiveDate {
        self.service.date()
    }

    pub fn select_date(&self, date: NaiveDate) {
        self.service.set_date(date);
    }

    pub fn search(&self, text: &str) {
        self.service.set_search(text);
    }

    pub fn empty_state(&self) -> EmptyState {
        self.service.snapshot().empty_state()
    }

    pub fn is_filter_highlighted(&self) -> bool {
        self.service.filter_mode().is_highlighted()
    }

    pub fn tap_filter(&self) -> Vec<FilterOption> {
        self.analytics
            .report(&AnalyticsEvent::click(MAIN_SCREEN, AnalyticsItem::Filter));
        let current = self.service.filter_mode();
        FilterMode::ALL
            .into_iter()
            .map(|mode| FilterOption {
                mode,
                title: mode.title(),
                checked: mode == current && mode.is_highlighted(),
            })
            .collect()
    }

    pub fn select_filter(&self, mode: FilterMode) {
        self.service.set_filter(mode);
    }

    pub fn sections(&self) -> Vec<CategorySection> {
        let snapshot = self.service.snapshot();
        snapshot
            .categories
            .into_iter()
            .map(|category| CategorySection {
                title: category.title,
                cards: category
                    .trackers
                    .into_iter()
                    .map(|tracker| self.card(tracker, snapshot.date))
                    .collect(),
            })
            .collect()
    }

    fn card(&self, tracker: Tracker, date: NaiveDate) -> TrackerCard {
        TrackerCard {
            completed_days: self.service.completed_days(tracker.id),
            is_completed: self.service.is_completed(tracker.id, date),
            can_toggle: self.service.check_completion(&tracker, date).is_ok(),
            tracker,
        }
    }

    /// Flips completion of `tracker_id` on the shown date. A refused mark
    /// yields `Ok(None)`; only store failures are errors.
    pub fn tap_completion(&self, tracker_id: Uuid) -> Result<Option<CompletionOutcome>> {
        self.analytics
            .report(&AnalyticsEvent::click(MAIN_SCREEN, AnalyticsItem::Track));
        let date = self.service.date();
        let mark = !self.service.is_completed(tracker_id, date);
        match self.service.toggle_completion(tracker_id, date, mark) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(TrackerError::Rejected(reason)) => {
                debug!(%tracker_id, %date, %reason, "completion refused");
                Ok(None)
            }
            Err(err) => Err(err).context("failed to store completion"),
        }
    }

    pub fn begin_create(&self, kind: TrackerKind) -> TrackerDraft {
        self.analytics
            .report(&AnalyticsEvent::click(MAIN_SCREEN, AnalyticsItem::AddTrack));
        match kind {
            TrackerKind::Habit => TrackerDraft::habit(),
            TrackerKind::IrregularEvent => TrackerDraft::irregular_event(),
        }
    }

    pub fn begin_edit(&self, tracker_id: Uuid) -> Option<TrackerDraft> {
        self.analytics
            .report(&AnalyticsEvent::click(MAIN_SCREEN, AnalyticsItem::Edit));
        self.service
            .tracker(tracker_id)
            .map(|(tracker, category)| TrackerDraft::for_edit(&tracker, &category))
    }

    pub fn save(&self, draft: &TrackerDraft) -> Result<Tracker> {
        let tracker = self
            .service
            .save_draft(draft)
            .with_context(|| format!("failed to save tracker `{}`", draft.name))?;
        info!(tracker_id = %tracker.id, "tracker saved from screen");
        Ok(tracker)
    }

    pub fn delete(&self, tracker_id: Uuid) -> Result<()> {
        self.analytics
            .report(&AnalyticsEvent::click(MAIN_SCREEN, AnalyticsItem::Delete));
        self.service
            .delete_tracker(tracker_id)
            .with_context(|| format!("failed to delete tracker {tracker_id}"))
    }
}
