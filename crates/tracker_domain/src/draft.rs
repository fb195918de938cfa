use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::tracker::{is_known_emoji, Tracker, TrackerColor, TrackerKind};
use crate::weekday::{Schedule, Weekday};

/// Form state of the create/edit tracker screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerDraft {
    id: Option<Uuid>,
    kind: TrackerKind,
    pub name: String,
    pub color: Option<TrackerColor>,
    pub emoji: Option<String>,
    pub schedule: Schedule,
    pub category: Option<String>,
}

impl TrackerDraft {
    pub fn habit() -> Self {
        Self::blank(TrackerKind::Habit)
    }

    pub fn irregular_event() -> Self {
        Self::blank(TrackerKind::IrregularEvent)
    }

    fn blank(kind: TrackerKind) -> Self {
        Self {
            id: None,
            kind,
            name: String::new(),
            color: None,
            emoji: None,
            schedule: Schedule::default(),
            category: None,
        }
    }

    /// Pre-filled draft that keeps the tracker's id when built.
    pub fn for_edit(tracker: &Tracker, category_title: &str) -> Self {
        Self {
            id: Some(tracker.id),
            kind: tracker.kind(),
            name: tracker.name.clone(),
            color: Some(tracker.color.clone()),
            emoji: Some(tracker.emoji.clone()),
            schedule: tracker.schedule.clone(),
            category: Some(category_title.to_string()),
        }
    }

    pub fn kind(&self) -> TrackerKind {
        self.kind
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_color(mut self, color: TrackerColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_category(mut self, title: impl Into<String>) -> Self {
        self.category = Some(title.into());
        self
    }

    pub fn toggle_day(&mut self, day: Weekday) {
        if !self.schedule.remove(day) {
            self.schedule.insert(day);
        }
    }

    /// Whether the confirm button should be enabled.
    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let color = self.color.as_ref().ok_or(ValidationError::MissingColor)?;
        if !color.is_in_palette() {
            return Err(ValidationError::ColorNotInPalette(color.hex().to_string()));
        }
        let emoji = self.emoji.as_deref().ok_or(ValidationError::MissingEmoji)?;
        if !is_known_emoji(emoji) {
            return Err(ValidationError::EmojiNotInSet(emoji.to_string()));
        }
        if self.kind == TrackerKind::Habit && self.schedule.is_empty() {
            return Err(ValidationError::EmptySchedule);
        }
        match self.category.as_deref() {
            Some(title) if !title.trim().is_empty() => Ok(()),
            _ => Err(ValidationError::MissingCategory),
        }
    }

    /// Produces the tracker and its category title.
    pub fn build(&self) -> Result<(Tracker, String), ValidationError> {
        self.validate()?;
        let schedule = match self.kind {
            TrackerKind::Habit => self.schedule.clone(),
            TrackerKind::IrregularEvent => Schedule::default(),
        };
        let tracker = Tracker {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name: self.name.trim().to_string(),
            color: self.color.clone().ok_or(ValidationError::MissingColor)?,
            emoji: self.emoji.clone().ok_or(ValidationError::MissingEmoji)?,
            schedule,
        };
        let category = self
            .category
            .as_deref()
            .map(|title| title.trim().to_string())
            .ok_or(ValidationError::MissingCategory)?;
        Ok((tracker, category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{EMOJIS, PALETTE};

    fn color() -> TrackerColor {
        TrackerColor::from_hex(PALETTE[7]).unwrap()
    }

    #[test]
    fn habit_draft_needs_every_field() {
        let draft = TrackerDraft::habit();
        assert_eq!(draft.validate(), Err(ValidationError::EmptyName));
        let draft = draft.with_name("Swim");
        assert_eq!(draft.validate(), Err(ValidationError::MissingColor));
        let draft = draft.with_color(color());
        assert_eq!(draft.validate(), Err(ValidationError::MissingEmoji));
        let draft = draft.with_emoji(EMOJIS[13]);
        assert_eq!(draft.validate(), Err(ValidationError::EmptySchedule));
        let mut draft = draft;
        draft.toggle_day(Weekday::Saturday);
        assert_eq!(draft.validate(), Err(ValidationError::MissingCategory));
        let draft = draft.with_category("Sport");
        assert!(draft.is_complete());

        let (tracker, category) = draft.build().unwrap();
        assert_eq!(tracker.name, "Swim");
        assert!(tracker.schedule.contains(Weekday::Saturday));
        assert_eq!(category, "Sport");
    }

    #[test]
    fn irregular_event_draft_has_empty_schedule() {
        let (tracker, _) = TrackerDraft::irregular_event()
            .with_name("Visit parents")
            .with_color(color())
            .with_emoji(EMOJIS[0])
            .with_schedule(Schedule::every_day())
            .with_category("Family")
            .build()
            .unwrap();
        assert!(tracker.is_irregular());
    }

    #[test]
    fn rejects_colors_and_emoji_outside_the_fixed_sets() {
        let draft = TrackerDraft::irregular_event()
            .with_name("Call")
            .with_color(TrackerColor::from_hex("#000000").unwrap())
            .with_emoji(EMOJIS[0])
            .with_category("Family");
        assert_eq!(
            draft.validate(),
            Err(ValidationError::ColorNotInPalette("#000000".into()))
        );
        let draft = draft.with_color(color()).with_emoji("🫡");
        assert_eq!(
            draft.validate(),
            Err(ValidationError::EmojiNotInSet("🫡".into()))
        );
    }

    #[test]
    fn edit_draft_keeps_id() {
        let original = Tracker::new("Read", color(), EMOJIS[1], Schedule::new([Weekday::Monday]));
        let draft = TrackerDraft::for_edit(&original, "Study").with_name("Read 20 pages");
        assert!(draft.is_edit());
        let (updated, category) = draft.build().unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.name, "Read 20 pages");
        assert_eq!(category, "Study");
    }

    #[test]
    fn built_category_title_is_trimmed() {
        let (_, category) = TrackerDraft::irregular_event()
            .with_name("Dentist")
            .with_color(color())
            .with_emoji(EMOJIS[2])
            .with_category(" Health ")
            .build()
            .unwrap();
        assert_eq!(category, "Health");
    }
}
