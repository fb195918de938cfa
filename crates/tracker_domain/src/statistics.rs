use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tracker::{Tracker, TrackerRecord};
use crate::weekday::Weekday;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Longest run of consecutive days with at least one completion.
    pub best_period: usize,
    /// Days on which every habit scheduled for that weekday was completed.
    pub perfect_days: usize,
    pub completed_trackers: usize,
    /// Completions per day that had any.
    pub average: f64,
}

impl Statistics {
    pub fn is_empty(&self) -> bool {
        self.completed_trackers == 0
    }

    pub fn compute(trackers: &[Tracker], records: &[TrackerRecord]) -> Self {
        let mut by_day: BTreeMap<NaiveDate, BTreeSet<Uuid>> = BTreeMap::new();
        for record in records {
            by_day.entry(record.date).or_default().insert(record.tracker_id);
        }
        let completed_trackers: usize = by_day.values().map(BTreeSet::len).sum();
        if completed_trackers == 0 {
            return Self::default();
        }

        Self {
            best_period: best_period(by_day.keys().copied()),
            perfect_days: by_day
                .iter()
                .filter(|(day, done)| is_perfect_day(trackers, **day, done))
                .count(),
            completed_trackers,
            average: completed_trackers as f64 / by_day.len() as f64,
        }
    }
}

fn best_period(days: impl Iterator<Item = NaiveDate>) -> usize {
    let mut best = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in days {
        current = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => current + 1,
            _ => 1,
        };
        best = best.max(current);
        previous = Some(day);
    }
    best
}

fn is_perfect_day(trackers: &[Tracker], day: NaiveDate, done: &BTreeSet<Uuid>) -> bool {
    let weekday = Weekday::of(day);
    trackers
        .iter()
        .filter(|tracker| tracker.schedule.contains(weekday))
        .all(|tracker| done.contains(&tracker.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{TrackerColor, EMOJIS, PALETTE};
    use crate::weekday::Schedule;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    fn tracker(schedule: Schedule) -> Tracker {
        Tracker::new(
            "Stretch",
            TrackerColor::from_hex(PALETTE[6]).unwrap(),
            EMOJIS[6],
            schedule,
        )
    }

    #[test]
    fn empty_history_has_empty_statistics() {
        let stats = Statistics::compute(&[], &[]);
        assert!(stats.is_empty());
        assert_eq!(stats.average, 0.0);
    }

    #[test]
    fn counts_streaks_perfect_days_and_average() {
        let daily = tracker(Schedule::every_day());
        let mondays = tracker(Schedule::new([Weekday::Monday]));
        let records = vec![
            // Mon 3rd: both done
            TrackerRecord::new(daily.id, day(3)),
            TrackerRecord::new(mondays.id, day(3)),
            // Tue 4th, Wed 5th: daily done
            TrackerRecord::new(daily.id, day(4)),
            TrackerRecord::new(daily.id, day(5)),
            // gap, then Mon 10th: only daily
            TrackerRecord::new(daily.id, day(10)),
        ];
        let stats = Statistics::compute(&[daily, mondays], &records);
        assert_eq!(stats.completed_trackers, 5);
        assert_eq!(stats.best_period, 3);
        assert_eq!(stats.perfect_days, 3);
        assert!((stats.average - 1.25).abs() < f64::EPSILON);
    }
}
