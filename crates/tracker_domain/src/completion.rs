use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CompletionRejected, TrackerError};
use crate::gateway::TrackerGateway;
use crate::schedule::Scheduler;
use crate::tracker::{Tracker, TrackerRecord};
use crate::weekday::{CalendarDay, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    Recorded,
    Removed,
    /// The requested state already held.
    Unchanged,
}

/// Set of completed (tracker, day) pairs for quick lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordIndex {
    records: HashSet<TrackerRecord>,
}

impl RecordIndex {
    pub fn new(records: impl IntoIterator<Item = TrackerRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn contains(&self, tracker_id: Uuid, day: impl CalendarDay) -> bool {
        self.records.contains(&TrackerRecord::new(tracker_id, day))
    }

    pub fn completed_days(&self, tracker_id: Uuid) -> usize {
        self.records
            .iter()
            .filter(|record| record.tracker_id == tracker_id)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackerRecord> {
        self.records.iter()
    }
}

impl FromIterator<TrackerRecord> for RecordIndex {
    fn from_iter<T: IntoIterator<Item = TrackerRecord>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Validates and applies completion marks through the gateway.
#[derive(Clone)]
pub struct CompletionEngine {
    gateway: Arc<dyn TrackerGateway>,
    scheduler: Scheduler,
}

impl CompletionEngine {
    pub fn new(gateway: Arc<dyn TrackerGateway>, scheduler: Scheduler) -> Self {
        Self { gateway, scheduler }
    }

    /// Checks whether `tracker` may be marked on `day`.
    pub fn check(&self, tracker: &Tracker, day: impl CalendarDay) -> Result<(), CompletionRejected> {
        check_completion(tracker, day.calendar_day(), self.scheduler.today())
    }

    /// Marks or unmarks `tracker_id` on `day`. The tracker must be among
    /// `known`. Both directions are idempotent.
    pub fn toggle(
        &self,
        known: &[Tracker],
        tracker_id: Uuid,
        day: impl CalendarDay,
        mark_complete: bool,
    ) -> Result<CompletionOutcome, TrackerError> {
        let day = day.calendar_day();
        let tracker = known
            .iter()
            .find(|tracker| tracker.id == tracker_id)
            .ok_or(CompletionRejected::UnknownTracker(tracker_id))?;
        self.check(tracker, day)?;

        let already = self
            .gateway
            .fetch_records(tracker_id)?
            .iter()
            .any(|record| record.is_on(tracker_id, day));

        let outcome = match (mark_complete, already) {
            (true, false) => {
                self.gateway.create_record(tracker_id, day)?;
                CompletionOutcome::Recorded
            }
            (false, true) => {
                self.gateway.delete_record(tracker_id, day)?;
                CompletionOutcome::Removed
            }
            _ => CompletionOutcome::Unchanged,
        };
        debug!(%tracker_id, %day, ?outcome, "completion toggled");
        Ok(outcome)
    }
}

/// Completion rules for a single (tracker, day) pair given today's date.
pub fn check_completion(
    tracker: &Tracker,
    day: NaiveDate,
    today: NaiveDate,
) -> Result<(), CompletionRejected> {
    if tracker.schedule.is_empty() {
        if day != today {
            return Err(CompletionRejected::IrregularEventNotToday { date: day, today });
        }
        return Ok(());
    }
    let weekday = Weekday::of(day);
    if !tracker.schedule.contains(weekday) {
        return Err(CompletionRejected::NotScheduled { weekday });
    }
    if day > today {
        return Err(CompletionRejected::FutureDate { date: day, today });
    }
    Ok(())
}
