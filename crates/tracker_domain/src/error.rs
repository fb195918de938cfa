use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::weekday::Weekday;

/// Malformed persisted rows. Collections skip the offending row and keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodingError {
    #[error("tracker row has no id")]
    MissingId,
    #[error("tracker row has an invalid id `{0}`")]
    InvalidId(String),
    #[error("tracker row has no name")]
    MissingName,
    #[error("tracker row has no color")]
    MissingColorHex,
    #[error("invalid color hex `{0}`")]
    InvalidColorHex(String),
    #[error("tracker row has no emoji")]
    MissingEmoji,
    #[error("weekday ordinal {0} is outside 1..=7")]
    InvalidWeekday(u8),
    #[error("malformed schedule payload: {0}")]
    InvalidSchedule(String),
    #[error("category row has no title")]
    MissingTitle,
    #[error("record row has no tracker id")]
    MissingTrackerId,
    #[error("record row has no date")]
    MissingDate,
    #[error("record row has an invalid date `{0}`")]
    InvalidDate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("save failed: {0}")]
    Save(String),
    #[error(transparent)]
    Decoding(#[from] DecodingError),
}

/// Reasons a completion mark is refused. Nothing is written when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionRejected {
    #[error("tracker {0} is not among the known trackers")]
    UnknownTracker(Uuid),
    #[error("irregular event can only be completed today ({today}), not {date}")]
    IrregularEventNotToday { date: NaiveDate, today: NaiveDate },
    #[error("tracker is not scheduled on {weekday}")]
    NotScheduled { weekday: Weekday },
    #[error("{date} is after today ({today})")]
    FutureDate { date: NaiveDate, today: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("tracker name must not be empty")]
    EmptyName,
    #[error("a color must be selected")]
    MissingColor,
    #[error("color {0} is not part of the palette")]
    ColorNotInPalette(String),
    #[error("an emoji must be selected")]
    MissingEmoji,
    #[error("emoji `{0}` is not part of the glyph set")]
    EmojiNotInSet(String),
    #[error("a habit needs at least one weekday")]
    EmptySchedule,
    #[error("a category must be selected")]
    MissingCategory,
    #[error("category title must not be empty")]
    EmptyCategoryTitle,
    #[error("category `{0}` already exists")]
    DuplicateCategory(String),
    #[error("category `{0}` does not exist")]
    UnknownCategory(String),
}

/// Change events that arrive without the index paths their kind requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeError {
    #[error("insert event without a new index")]
    InsertWithoutIndex,
    #[error("delete event without an index")]
    DeleteWithoutIndex,
    #[error("update event without an index")]
    UpdateWithoutIndex,
    #[error("move event without both indexes")]
    MoveWithoutIndexes,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Rejected(#[from] CompletionRejected),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<DecodingError> for TrackerError {
    fn from(value: DecodingError) -> Self {
        TrackerError::Store(StoreError::Decoding(value))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
