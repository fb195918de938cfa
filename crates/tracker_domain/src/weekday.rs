use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::DecodingError;

/// Raw weekday number of Monday on a Sunday = 1 scale. Weeks always start on
/// Monday regardless of locale.
pub const FIRST_WEEKDAY: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Weekday {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
    Sunday = 7,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            1 => Some(Weekday::Monday),
            2 => Some(Weekday::Tuesday),
            3 => Some(Weekday::Wednesday),
            4 => Some(Weekday::Thursday),
            5 => Some(Weekday::Friday),
            6 => Some(Weekday::Saturday),
            7 => Some(Weekday::Sunday),
            _ => None,
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Rotates a Sunday = 1 weekday number onto the Monday = 1 scale.
    pub fn from_sunday_based(raw: u32) -> Option<Self> {
        let shifted = raw as i64 - FIRST_WEEKDAY as i64 + 1;
        let adjusted = if shifted <= 0 { shifted + 7 } else { shifted };
        u8::try_from(adjusted).ok().and_then(Self::from_ordinal)
    }

    pub fn of(day: impl CalendarDay) -> Self {
        Self::from(day.calendar_day().weekday())
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Weekday::Monday => "Mon",
            Weekday::Tuesday => "Tue",
            Weekday::Wednesday => "Wed",
            Weekday::Thursday => "Thu",
            Weekday::Friday => "Fri",
            Weekday::Saturday => "Sat",
            Weekday::Sunday => "Sun",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl TryFrom<u8> for Weekday {
    type Error = DecodingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_ordinal(value).ok_or(DecodingError::InvalidWeekday(value))
    }
}

impl From<Weekday> for u8 {
    fn from(value: Weekday) -> Self {
        value.ordinal()
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(value: chrono::Weekday) -> Self {
        match value {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

/// Weekly repeat pattern of a tracker. An empty schedule marks an irregular event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Schedule(BTreeSet<Weekday>);

impl Schedule {
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Self {
        Self(days.into_iter().collect())
    }

    pub fn every_day() -> Self {
        Self::new(Weekday::ALL)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn insert(&mut self, day: Weekday) -> bool {
        self.0.insert(day)
    }

    pub fn remove(&mut self, day: Weekday) -> bool {
        self.0.remove(&day)
    }

    /// Days in Monday-first order.
    pub fn days(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.0.iter().copied()
    }

    pub fn ordinals(&self) -> Vec<u8> {
        self.days().map(Weekday::ordinal).collect()
    }

    pub fn summary(&self) -> String {
        if self.0.len() == Weekday::ALL.len() {
            return "Every day".to_string();
        }
        self.days()
            .map(Weekday::short_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl TryFrom<Vec<u8>> for Schedule {
    type Error = DecodingError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        value
            .into_iter()
            .map(Weekday::try_from)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Schedule)
    }
}

impl From<Schedule> for Vec<u8> {
    fn from(value: Schedule) -> Self {
        value.ordinals()
    }
}

impl FromIterator<Weekday> for Schedule {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Anything that falls on a single calendar day. Time of day is dropped.
pub trait CalendarDay {
    fn calendar_day(&self) -> NaiveDate;
}

impl CalendarDay for NaiveDate {
    fn calendar_day(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDay for NaiveDateTime {
    fn calendar_day(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CalendarDay for DateTime<Tz> {
    fn calendar_day(&self) -> NaiveDate {
        self.date_naive()
    }
}

impl<T: CalendarDay + ?Sized> CalendarDay for &T {
    fn calendar_day(&self) -> NaiveDate {
        (**self).calendar_day()
    }
}
