use std::sync::Arc;

use chrono::{Local, NaiveDate};
use parking_lot::RwLock;

use crate::tracker::Tracker;
use crate::weekday::{CalendarDay, Weekday};

/// Source of "today" for every day-boundary rule.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a given day; `set` moves it.
#[derive(Debug)]
pub struct FixedClock {
    today: RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: RwLock::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.write() = today;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.read()
    }
}

/// Decides which trackers are due on a given day.
#[derive(Clone)]
pub struct Scheduler {
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn is_today(&self, day: impl CalendarDay) -> bool {
        day.calendar_day() == self.today()
    }

    /// Habits are due on every day whose weekday is scheduled; irregular
    /// events only on the current day.
    pub fn is_due(&self, tracker: &Tracker, day: impl CalendarDay) -> bool {
        let day = day.calendar_day();
        if tracker.schedule.is_empty() {
            return self.is_today(day);
        }
        tracker.schedule.contains(Weekday::of(day))
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("today", &self.today())
            .finish()
    }
}
