use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DecodingError, StoreError, StoreResult};
use crate::gateway::TrackerGateway;
use crate::notifications::{diff_keys, diff_positions, StoreEntity, StoreObserver, StoreUpdate, SubscriptionId};
use crate::tracker::{Tracker, TrackerCategory, TrackerColor, TrackerRecord};
use crate::weekday::Schedule;

/// Persisted shape of a tracker. Every attribute is optional at rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredTracker {
    pub id: Option<String>,
    pub name: Option<String>,
    pub color_hex: Option<String>,
    pub emoji: Option<String>,
    pub schedule: Option<serde_json::Value>,
    pub category: Option<String>,
}

impl StoredTracker {
    pub fn encode(tracker: &Tracker, category_title: &str) -> Self {
        Self {
            id: Some(tracker.id.to_string()),
            name: Some(tracker.name.clone()),
            color_hex: Some(tracker.color.hex().to_string()),
            emoji: Some(tracker.emoji.clone()),
            schedule: Some(serde_json::Value::from(tracker.schedule.ordinals())),
            category: Some(category_title.to_string()),
        }
    }

    pub fn decode(&self) -> Result<(Tracker, String), DecodingError> {
        let raw_id = self.id.as_deref().ok_or(DecodingError::MissingId)?;
        let id = Uuid::parse_str(raw_id).map_err(|_| DecodingError::InvalidId(raw_id.to_string()))?;
        let name = non_empty(&self.name).ok_or(DecodingError::MissingName)?;
        let color_hex = self.color_hex.as_deref().ok_or(DecodingError::MissingColorHex)?;
        let color = TrackerColor::from_hex(color_hex)?;
        let emoji = self.emoji.clone().ok_or(DecodingError::MissingEmoji)?;
        let schedule = match &self.schedule {
            None => Schedule::default(),
            Some(payload) => {
                let ordinals: Vec<u8> = serde_json::from_value(payload.clone())
                    .map_err(|err| DecodingError::InvalidSchedule(err.to_string()))?;
                Schedule::try_from(ordinals)?
            }
        };
        let category = non_empty(&self.category).ok_or(DecodingError::MissingTitle)?;
        Ok((
            Tracker {
                id,
                name,
                color,
                emoji,
                schedule,
            },
            category,
        ))
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field.as_ref().filter(|value| !value.trim().is_empty()).cloned()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredCategory {
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub tracker_id: Option<String>,
    pub date: Option<String>,
}

impl StoredRecord {
    pub fn encode(record: &TrackerRecord) -> Self {
        Self {
            tracker_id: Some(record.tracker_id.to_string()),
            date: Some(record.date.format("%Y-%m-%d").to_string()),
        }
    }

    pub fn decode(&self) -> Result<TrackerRecord, DecodingError> {
        let raw_id = self.tracker_id.as_deref().ok_or(DecodingError::MissingTrackerId)?;
        let tracker_id =
            Uuid::parse_str(raw_id).map_err(|_| DecodingError::InvalidId(raw_id.to_string()))?;
        let raw_date = self.date.as_deref().ok_or(DecodingError::MissingDate)?;
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|_| DecodingError::InvalidDate(raw_date.to_string()))?;
        Ok(TrackerRecord { tracker_id, date })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub categories: Vec<StoredCategory>,
    #[serde(default)]
    pub trackers: Vec<StoredTracker>,
    #[serde(default)]
    pub records: Vec<StoredRecord>,
}

#[derive(Debug, Clone, Default)]
struct State {
    categories: BTreeSet<String>,
    trackers: HashMap<Uuid, (Tracker, String)>,
    records: BTreeSet<TrackerRecord>,
}

impl State {
    fn sorted_trackers(&self) -> Vec<(Uuid, (Tracker, String))> {
        let mut entries: Vec<(Uuid, (Tracker, String))> = self
            .trackers
            .iter()
            .map(|(id, entry)| (*id, entry.clone()))
            .collect();
        entries.sort_by(|(a_id, (a, _)), (b_id, (b, _))| a.name.cmp(&b.name).then(a_id.cmp(b_id)));
        entries
    }

    fn trackers_in(&self, title: &str) -> Vec<Tracker> {
        self.sorted_trackers()
            .into_iter()
            .filter(|(_, (_, category))| category == title)
            .map(|(_, (tracker, _))| tracker)
            .collect()
    }

    fn category_keys(&self) -> Vec<(String, Vec<Uuid>)> {
        self.categories
            .iter()
            .map(|title| {
                let ids = self.trackers_in(title).iter().map(|tracker| tracker.id).collect();
                (title.clone(), ids)
            })
            .collect()
    }

    /// Newest first.
    fn sorted_records(&self) -> Vec<TrackerRecord> {
        let mut records: Vec<TrackerRecord> = self.records.iter().copied().collect();
        records.sort_by(|a, b| b.date.cmp(&a.date).then(a.tracker_id.cmp(&b.tracker_id)));
        records
    }

    fn diff(&self, after: &State, entity: StoreEntity) -> StoreUpdate {
        match entity {
            StoreEntity::Trackers => {
                diff_positions(entity, &self.sorted_trackers(), &after.sorted_trackers())
            }
            StoreEntity::Categories => {
                diff_positions(entity, &self.category_keys(), &after.category_keys())
            }
            StoreEntity::Records => {
                diff_keys(entity, &self.sorted_records(), &after.sorted_records())
            }
        }
    }

    fn remove_tracker(&mut self, id: Uuid) -> bool {
        let existed = self.trackers.remove(&id).is_some();
        self.records.retain(|record| record.tracker_id != id);
        existed
    }
}

/// Reference gateway keeping everything in memory.
pub struct MemoryStore {
    state: RwLock<State>,
    observers: Mutex<Vec<(SubscriptionId, Arc<dyn StoreObserver>)>>,
    next_subscription: AtomicU64,
    failing: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            observers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            failing: AtomicBool::new(false),
        }
    }

    /// Loads persisted rows. Rows that fail to decode are logged and skipped.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut state = State::default();
        for row in &snapshot.categories {
            match &row.title {
                Some(title) if !title.trim().is_empty() => {
                    state.categories.insert(title.clone());
                }
                _ => warn!(err = %DecodingError::MissingTitle, "skipping category row"),
            }
        }
        for row in &snapshot.trackers {
            match row.decode() {
                Ok((tracker, category)) => {
                    state.categories.insert(category.clone());
                    state.trackers.insert(tracker.id, (tracker, category));
                }
                Err(err) => warn!(%err, id = ?row.id, "skipping tracker row"),
            }
        }
        for row in &snapshot.records {
            match row.decode() {
                Ok(record) if state.trackers.contains_key(&record.tracker_id) => {
                    state.records.insert(record);
                }
                Ok(record) => {
                    debug!(tracker_id = %record.tracker_id, "dropping record of unknown tracker")
                }
                Err(err) => warn!(%err, "skipping record row"),
            }
        }
        Self {
            state: RwLock::new(state),
            ..Self::new()
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.read();
        Snapshot {
            categories: state
                .categories
                .iter()
                .map(|title| StoredCategory {
                    title: Some(title.clone()),
                })
                .collect(),
            trackers: state
                .sorted_trackers()
                .iter()
                .map(|(_, (tracker, category))| StoredTracker::encode(tracker, category))
                .collect(),
            records: state
                .sorted_records()
                .iter()
                .map(StoredRecord::encode)
                .collect(),
        }
    }

    /// While set, every write fails with `StoreError::Save` and changes nothing.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn write<T>(
        &self,
        entities: &[StoreEntity],
        op: impl FnOnce(&mut State) -> StoreResult<T>,
    ) -> StoreResult<T> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Save("store rejected the write".into()));
        }
        let (value, updates) = {
            let mut state = self.state.write();
            let before = state.clone();
            let value = match op(&mut *state) {
                Ok(value) => value,
                Err(err) => {
                    *state = before;
                    return Err(err);
                }
            };
            let updates: Vec<StoreUpdate> = entities
                .iter()
                .map(|entity| before.diff(&*state, *entity))
                .filter(|update| !update.is_empty())
                .collect();
            (value, updates)
        };
        self.notify(&updates);
        Ok(value)
    }

    fn notify(&self, updates: &[StoreUpdate]) {
        if updates.is_empty() {
            return;
        }
        let observers: Vec<Arc<dyn StoreObserver>> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        debug!(
            entities = ?updates.iter().map(|update| update.entity).collect::<Vec<_>>(),
            "store changed"
        );
        for observer in &observers {
            observer.store_did_change(updates);
        }
    }
}

impl TrackerGateway for MemoryStore {
    fn create_tracker(&self, tracker: &Tracker, category_title: &str) -> StoreResult<()> {
        self.write(&[StoreEntity::Trackers, StoreEntity::Categories], |state| {
            if !state.categories.contains(category_title) {
                return Err(StoreError::Fetch(format!(
                    "category `{category_title}` not found"
                )));
            }
            if state.trackers.contains_key(&tracker.id) {
                return Err(StoreError::Save(format!("tracker {} already exists", tracker.id)));
            }
            state
                .trackers
                .insert(tracker.id, (tracker.clone(), category_title.to_string()));
            Ok(())
        })
    }

    fn update_tracker(&self, tracker: &Tracker, category_title: &str) -> StoreResult<()> {
        self.write(&[StoreEntity::Trackers, StoreEntity::Categories], |state| {
            if !state.categories.contains(category_title) {
                return Err(StoreError::Fetch(format!(
                    "category `{category_title}` not found"
                )));
            }
            let entry = state
                .trackers
                .get_mut(&tracker.id)
                .ok_or_else(|| StoreError::Save(format!("tracker {} not found", tracker.id)))?;
            *entry = (tracker.clone(), category_title.to_string());
            Ok(())
        })
    }

    fn delete_tracker(&self, id: Uuid) -> StoreResult<()> {
        let entities = [
            StoreEntity::Trackers,
            StoreEntity::Categories,
            StoreEntity::Records,
        ];
        self.write(&entities, |state| {
            state.remove_tracker(id);
            Ok(())
        })
    }

    fn fetch_all_trackers(&self) -> StoreResult<Vec<Tracker>> {
        Ok(self
            .state
            .read()
            .sorted_trackers()
            .into_iter()
            .map(|(_, (tracker, _))| tracker)
            .collect())
    }

    fn create_category(&self, title: &str) -> StoreResult<()> {
        self.write(&[StoreEntity::Categories], |state| {
            if title.trim().is_empty() {
                return Err(StoreError::Save("category title is empty".into()));
            }
            state.categories.insert(title.to_string());
            Ok(())
        })
    }

    fn fetch_category(&self, title: &str) -> StoreResult<Option<TrackerCategory>> {
        let state = self.state.read();
        Ok(state
            .categories
            .get(title)
            .map(|title| TrackerCategory::new(title.clone(), state.trackers_in(title))))
    }

    fn delete_category(&self, title: &str) -> StoreResult<()> {
        let entities = [
            StoreEntity::Categories,
            StoreEntity::Trackers,
            StoreEntity::Records,
        ];
        self.write(&entities, |state| {
            if !state.categories.remove(title) {
                return Ok(());
            }
            let owned: Vec<Uuid> = state
                .trackers
                .iter()
                .filter(|(_, (_, category))| category == title)
                .map(|(id, _)| *id)
                .collect();
            for id in owned {
                state.remove_tracker(id);
            }
            Ok(())
        })
    }

    fn fetch_all_categories(&self) -> StoreResult<Vec<TrackerCategory>> {
        let state = self.state.read();
        Ok(state
            .categories
            .iter()
            .map(|title| TrackerCategory::new(title.clone(), state.trackers_in(title)))
            .collect())
    }

    fn create_record(&self, tracker_id: Uuid, day: NaiveDate) -> StoreResult<()> {
        self.write(&[StoreEntity::Records], |state| {
            if !state.trackers.contains_key(&tracker_id) {
                return Err(StoreError::Save(format!("tracker {tracker_id} not found")));
            }
            state.records.insert(TrackerRecord::new(tracker_id, day));
            Ok(())
        })
    }

    fn delete_record(&self, tracker_id: Uuid, day: NaiveDate) -> StoreResult<()> {
        self.write(&[StoreEntity::Records], |state| {
            state.records.remove(&TrackerRecord::new(tracker_id, day));
            Ok(())
        })
    }

    fn fetch_all_records(&self) -> StoreResult<Vec<TrackerRecord>> {
        Ok(self
            .state
            .read()
            .sorted_records())
    }

    fn subscribe(&self, observer: Arc<dyn StoreObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.observers.lock().push((id, observer));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.observers.lock().retain(|(candidate, _)| *candidate != id);
    }
}
