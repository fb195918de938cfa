use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DecodingError;
use crate::weekday::{CalendarDay, Schedule};

pub const PALETTE: [&str; 18] = [
    "#FD4C49", "#FF881E", "#007BFA", "#6E44FE", "#33CF69", "#E66DD4", "#F9D4D4", "#34A7FE",
    "#46E69D", "#35347C", "#FF674D", "#FF99CC", "#F6C48B", "#7994F5", "#832CF1", "#AD56DA",
    "#8D72E6", "#2FD058",
];

pub const EMOJIS: [&str; 18] = [
    "🙂", "😻", "🌺", "🐶", "❤️", "😱", "😇", "😡", "🥶", "🤔", "🙌", "🍔", "🥦", "🏓", "🥇", "🎸",
    "🏝", "😪",
];

/// Card color, stored as an upper-case `#RRGGBB` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackerColor(String);

impl TrackerColor {
    pub fn from_hex(hex: &str) -> Result<Self, DecodingError> {
        let trimmed = hex.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| DecodingError::InvalidColorHex(hex.to_string()))?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DecodingError::InvalidColorHex(hex.to_string()));
        }
        Ok(Self(format!("#{}", digits.to_ascii_uppercase())))
    }

    pub fn palette() -> impl Iterator<Item = TrackerColor> {
        PALETTE.iter().map(|hex| TrackerColor(hex.to_string()))
    }

    pub fn hex(&self) -> &str {
        &self.0
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&self.0[range], 16).unwrap_or_default()
        };
        (channel(1..3), channel(3..5), channel(5..7))
    }

    pub fn is_in_palette(&self) -> bool {
        PALETTE.contains(&self.0.as_str())
    }
}

impl TryFrom<String> for TrackerColor {
    type Error = DecodingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<TrackerColor> for String {
    fn from(value: TrackerColor) -> Self {
        value.0
    }
}

impl fmt::Display for TrackerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_known_emoji(emoji: &str) -> bool {
    EMOJIS.contains(&emoji)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerKind {
    Habit,
    IrregularEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: Uuid,
    pub name: String,
    pub color: TrackerColor,
    pub emoji: String,
    pub schedule: Schedule,
}

impl Tracker {
    pub fn new(name: impl Into<String>, color: TrackerColor, emoji: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color,
            emoji: emoji.into(),
            schedule,
        }
    }

    pub fn kind(&self) -> TrackerKind {
        if self.schedule.is_empty() {
            TrackerKind::IrregularEvent
        } else {
            TrackerKind::Habit
        }
    }

    pub fn is_irregular(&self) -> bool {
        self.kind() == TrackerKind::IrregularEvent
    }

    /// Case-insensitive substring match. An empty query matches everything.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Named group of trackers. The title is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerCategory {
    pub title: String,
    pub trackers: Vec<Tracker>,
}

impl TrackerCategory {
    pub fn new(title: impl Into<String>, trackers: Vec<Tracker>) -> Self {
        Self {
            title: title.into(),
            trackers,
        }
    }

    pub fn empty(title: impl Into<String>) -> Self {
        Self::new(title, Vec::new())
    }

    pub fn tracker(&self, id: Uuid) -> Option<&Tracker> {
        self.trackers.iter().find(|tracker| tracker.id == id)
    }
}

/// Completion of a tracker on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackerRecord {
    pub tracker_id: Uuid,
    pub date: NaiveDate,
}

impl TrackerRecord {
    pub fn new(tracker_id: Uuid, day: impl CalendarDay) -> Self {
        Self {
            tracker_id,
            date: day.calendar_day(),
        }
    }

    pub fn is_on(&self, tracker_id: Uuid, day: impl CalendarDay) -> bool {
        self.tracker_id == tracker_id && self.date == day.calendar_day()
    }
}
