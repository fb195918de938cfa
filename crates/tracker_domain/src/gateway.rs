use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::notifications::{StoreObserver, SubscriptionId};
use crate::tracker::{Tracker, TrackerCategory, TrackerRecord};

/// CRUD and change-notification contract of the persistence layer.
///
/// Every call is synchronous. A failed write leaves the store as it was.
/// Observers are notified of every change, including changes made through the
/// same handle, and should respond by re-fetching.
pub trait TrackerGateway: Send + Sync {
    /// Fails with `StoreError::Fetch` when the category does not exist.
    fn create_tracker(&self, tracker: &Tracker, category_title: &str) -> StoreResult<()>;

    /// Replaces every field of the tracker with the same id and moves it to
    /// `category_title`.
    fn update_tracker(&self, tracker: &Tracker, category_title: &str) -> StoreResult<()>;

    /// Deletes the tracker together with all of its records.
    fn delete_tracker(&self, id: Uuid) -> StoreResult<()>;

    fn fetch_all_trackers(&self) -> StoreResult<Vec<Tracker>>;

    /// Uniqueness of `title` is the caller's responsibility.
    fn create_category(&self, title: &str) -> StoreResult<()>;

    fn fetch_category(&self, title: &str) -> StoreResult<Option<TrackerCategory>>;

    /// Deletes the category, its trackers and their records.
    fn delete_category(&self, title: &str) -> StoreResult<()>;

    fn fetch_all_categories(&self) -> StoreResult<Vec<TrackerCategory>>;

    fn create_record(&self, tracker_id: Uuid, day: NaiveDate) -> StoreResult<()>;

    fn delete_record(&self, tracker_id: Uuid, day: NaiveDate) -> StoreResult<()>;

    fn fetch_all_records(&self) -> StoreResult<Vec<TrackerRecord>>;

    fn fetch_records(&self, tracker_id: Uuid) -> StoreResult<Vec<TrackerRecord>> {
        Ok(self
            .fetch_all_records()?
            .into_iter()
            .filter(|record| record.tracker_id == tracker_id)
            .collect())
    }

    fn subscribe(&self, observer: Arc<dyn StoreObserver>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}
