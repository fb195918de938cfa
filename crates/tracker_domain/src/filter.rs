use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::completion::RecordIndex;
use crate::schedule::Scheduler;
use crate::tracker::{Tracker, TrackerCategory};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    AllTrackers,
    /// Jumps to today, then shows everything due.
    TrackersToday,
    Completed,
    Incomplete,
}

impl FilterMode {
    pub const ALL: [FilterMode; 4] = [
        FilterMode::AllTrackers,
        FilterMode::TrackersToday,
        FilterMode::Completed,
        FilterMode::Incomplete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::AllTrackers => "all_trackers",
            FilterMode::TrackersToday => "trackers_today",
            FilterMode::Completed => "completed",
            FilterMode::Incomplete => "incomplete",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            FilterMode::AllTrackers => "All trackers",
            FilterMode::TrackersToday => "Trackers for today",
            FilterMode::Completed => "Completed",
            FilterMode::Incomplete => "Not completed",
        }
    }

    /// Modes that actually narrow the list; the filter button shows them as active.
    pub fn is_highlighted(self) -> bool {
        matches!(self, FilterMode::Completed | FilterMode::Incomplete)
    }

    pub fn resets_date(self) -> bool {
        self == FilterMode::TrackersToday
    }

    fn admits(self, tracker: &Tracker, date: NaiveDate, records: &RecordIndex) -> bool {
        match self {
            FilterMode::AllTrackers | FilterMode::TrackersToday => true,
            FilterMode::Completed => records.contains(tracker.id, date),
            FilterMode::Incomplete => !records.contains(tracker.id, date),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter mode `{0}`")]
pub struct UnknownFilterMode(pub String);

impl FromStr for FilterMode {
    type Err = UnknownFilterMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        FilterMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| UnknownFilterMode(s.to_string()))
    }
}

/// Inputs of one projection of the tracker list.
#[derive(Debug, Clone, Copy)]
pub struct FilterQuery<'a> {
    pub date: NaiveDate,
    pub search: &'a str,
    pub mode: FilterMode,
}

/// Composes due, search and completion filters into the visible categories.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    scheduler: Scheduler,
}

impl FilterEngine {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn admits(&self, tracker: &Tracker, query: &FilterQuery<'_>, records: &RecordIndex) -> bool {
        self.scheduler.is_due(tracker, query.date)
            && tracker.matches_search(query.search)
            && query.mode.admits(tracker, query.date, records)
    }

    /// Categories keep their titles and input order; empty ones are dropped.
    pub fn visible_categories(
        &self,
        categories: &[TrackerCategory],
        query: &FilterQuery<'_>,
        records: &RecordIndex,
    ) -> Vec<TrackerCategory> {
        categories
            .iter()
            .filter_map(|category| {
                let trackers: Vec<Tracker> = category
                    .trackers
                    .iter()
                    .filter(|tracker| self.admits(tracker, query, records))
                    .cloned()
                    .collect();
                if trackers.is_empty() {
                    None
                } else {
                    Some(TrackerCategory::new(category.title.clone(), trackers))
                }
            })
            .collect()
    }

    /// Whether anything is due on `date`, ignoring search and completion filters.
    pub fn has_due_trackers(&self, categories: &[TrackerCategory], date: NaiveDate) -> bool {
        categories
            .iter()
            .flat_map(|category| category.trackers.iter())
            .any(|tracker| self.scheduler.is_due(tracker, date))
    }
}
