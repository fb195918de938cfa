use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::completion::{CompletionEngine, CompletionOutcome, RecordIndex};
use crate::draft::TrackerDraft;
use crate::error::{CompletionRejected, StoreError, TrackerError, ValidationError};
use crate::filter::{FilterEngine, FilterMode, FilterQuery};
use crate::gateway::TrackerGateway;
use crate::notifications::{StoreObserver, StoreUpdate, SubscriptionId};
use crate::schedule::{Clock, Scheduler, SystemClock};
use crate::statistics::Statistics;
use crate::tracker::{Tracker, TrackerCategory};
use crate::weekday::CalendarDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    Content,
    /// Nothing is due on the selected date at all.
    NoTrackers,
    /// Something is due, but search or filter hides it.
    NothingFound,
}

/// What the trackers screen shows for the current date, search and filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleSnapshot {
    pub date: NaiveDate,
    pub today: NaiveDate,
    pub search: String,
    pub mode: FilterMode,
    pub categories: Vec<TrackerCategory>,
    pub has_due_trackers: bool,
}

impl VisibleSnapshot {
    pub fn empty_state(&self) -> EmptyState {
        if !self.has_due_trackers {
            EmptyState::NoTrackers
        } else if self.categories.is_empty() {
            EmptyState::NothingFound
        } else {
            EmptyState::Content
        }
    }

    pub fn trackers(&self) -> impl Iterator<Item = &Tracker> {
        self.categories.iter().flat_map(|category| category.trackers.iter())
    }
}

/// Downstream consumer of recomputed projections.
pub trait TrackerObserver: Send + Sync {
    fn visible_changed(&self, snapshot: &VisibleSnapshot);
}

impl<F> TrackerObserver for F
where
    F: Fn(&VisibleSnapshot) + Send + Sync,
{
    fn visible_changed(&self, snapshot: &VisibleSnapshot) {
        self(snapshot)
    }
}

#[derive(Debug, Clone)]
struct ViewState {
    categories: Vec<TrackerCategory>,
    records: RecordIndex,
    date: NaiveDate,
    search: String,
    mode: FilterMode,
}

struct Inner {
    gateway: Arc<dyn TrackerGateway>,
    scheduler: Scheduler,
    completion: CompletionEngine,
    filter: FilterEngine,
    state: RwLock<ViewState>,
    observers: Mutex<Vec<Arc<dyn TrackerObserver>>>,
}

impl Inner {
    fn reload(&self) -> Result<(), TrackerError> {
        let categories = self.gateway.fetch_all_categories()?;
        let records: RecordIndex = self.gateway.fetch_all_records()?.into_iter().collect();
        {
            let mut state = self.state.write();
            state.categories = categories;
            state.records = records;
        }
        self.publish();
        Ok(())
    }

    fn snapshot(&self) -> VisibleSnapshot {
        let state = self.state.read();
        let query = FilterQuery {
            date: state.date,
            search: &state.search,
            mode: state.mode,
        };
        VisibleSnapshot {
            date: state.date,
            today: self.scheduler.today(),
            search: state.search.clone(),
            mode: state.mode,
            categories: self
                .filter
                .visible_categories(&state.categories, &query, &state.records),
            has_due_trackers: self.filter.has_due_trackers(&state.categories, state.date),
        }
    }

    /// Observers run without any service lock held and may call back in.
    fn publish(&self) {
        let snapshot = self.snapshot();
        let observers: Vec<Arc<dyn TrackerObserver>> = self.observers.lock().clone();
        for observer in &observers {
            observer.visible_changed(&snapshot);
        }
    }
}

impl StoreObserver for Inner {
    fn store_did_change(&self, batch: &[StoreUpdate]) {
        debug!(updates = batch.len(), "store changed, reloading");
        if let Err(err) = self.reload() {
            warn!(%err, "reload after store update failed");
        }
    }
}

pub struct TrackerServiceBuilder {
    gateway: Arc<dyn TrackerGateway>,
    clock: Arc<dyn Clock>,
    mode: FilterMode,
    observers: Vec<Arc<dyn TrackerObserver>>,
}

impl TrackerServiceBuilder {
    pub fn new(gateway: Arc<dyn TrackerGateway>) -> Self {
        Self {
            gateway,
            clock: Arc::new(SystemClock),
            mode: FilterMode::default(),
            observers: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn TrackerObserver>) -> Self {
        self.observers.push(Arc::from(observer));
        self
    }

    pub fn build(self) -> Result<TrackerService, TrackerError> {
        let scheduler = Scheduler::new(self.clock);
        let inner = Arc::new(Inner {
            completion: CompletionEngine::new(self.gateway.clone(), scheduler.clone()),
            filter: FilterEngine::new(scheduler.clone()),
            state: RwLock::new(ViewState {
                categories: Vec::new(),
                records: RecordIndex::default(),
                date: scheduler.today(),
                search: String::new(),
                mode: self.mode,
            }),
            observers: Mutex::new(self.observers),
            gateway: self.gateway,
            scheduler,
        });
        inner.reload()?;
        let subscription = inner.gateway.subscribe(inner.clone());
        Ok(TrackerService {
            inner,
            subscription,
        })
    }
}

/// Facade over the engines and the injected gateway. Every store change
/// triggers a full re-fetch and a fresh projection for observers.
pub struct TrackerService {
    inner: Arc<Inner>,
    subscription: SubscriptionId,
}

impl TrackerService {
    pub fn builder(gateway: Arc<dyn TrackerGateway>) -> TrackerServiceBuilder {
        TrackerServiceBuilder::new(gateway)
    }

    pub fn add_observer(&self, observer: Box<dyn TrackerObserver>) {
        self.inner.observers.lock().push(Arc::from(observer));
    }

    pub fn refresh(&self) -> Result<(), TrackerError> {
        self.inner.reload()
    }

    pub fn snapshot(&self) -> VisibleSnapshot {
        self.inner.snapshot()
    }

    pub fn today(&self) -> NaiveDate {
        self.inner.scheduler.today()
    }

    pub fn date(&self) -> NaiveDate {
        self.inner.state.read().date
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.inner.state.read().mode
    }

    pub fn search_text(&self) -> String {
        self.inner.state.read().search.clone()
    }

    pub fn set_date(&self, day: impl CalendarDay) {
        self.inner.state.write().date = day.calendar_day();
        self.inner.publish();
    }

    pub fn set_search(&self, text: impl Into<String>) {
        self.inner.state.write().search = text.into();
        self.inner.publish();
    }

    /// `TrackersToday` also moves the selected date back to today.
    pub fn set_filter(&self, mode: FilterMode) {
        {
            let mut state = self.inner.state.write();
            state.mode = mode;
            if mode.resets_date() {
                state.date = self.inner.scheduler.today();
            }
        }
        debug!(%mode, "filter selected");
        self.inner.publish();
    }

    pub fn categories(&self) -> Vec<TrackerCategory> {
        self.inner.state.read().categories.clone()
    }

    pub fn category_titles(&self) -> Vec<String> {
        self.inner
            .state
            .read()
            .categories
            .iter()
            .map(|category| category.title.clone())
            .collect()
    }

    pub fn trackers(&self) -> Vec<Tracker> {
        self.inner
            .state
            .read()
            .categories
            .iter()
            .flat_map(|category| category.trackers.iter().cloned())
            .collect()
    }

    pub fn tracker(&self, id: Uuid) -> Option<(Tracker, String)> {
        self.inner.state.read().categories.iter().find_map(|category| {
            category
                .tracker(id)
                .map(|tracker| (tracker.clone(), category.title.clone()))
        })
    }

    pub fn is_completed(&self, tracker_id: Uuid, day: impl CalendarDay) -> bool {
        self.inner.state.read().records.contains(tracker_id, day)
    }

    pub fn completed_days(&self, tracker_id: Uuid) -> usize {
        self.inner.state.read().records.completed_days(tracker_id)
    }

    pub fn is_due(&self, tracker: &Tracker, day: impl CalendarDay) -> bool {
        self.inner.scheduler.is_due(tracker, day)
    }

    /// Dry run of the completion rules; nothing is written.
    pub fn check_completion(
        &self,
        tracker: &Tracker,
        day: impl CalendarDay,
    ) -> Result<(), CompletionRejected> {
        self.inner.completion.check(tracker, day)
    }

    pub fn statistics(&self) -> Statistics {
        let state = self.inner.state.read();
        let trackers: Vec<Tracker> = state
            .categories
            .iter()
            .flat_map(|category| category.trackers.iter().cloned())
            .collect();
        let records: Vec<_> = state.records.iter().copied().collect();
        Statistics::compute(&trackers, &records)
    }

    #[instrument(skip(self))]
    pub fn toggle_completion(
        &self,
        tracker_id: Uuid,
        day: NaiveDate,
        mark_complete: bool,
    ) -> Result<CompletionOutcome, TrackerError> {
        let known = self.trackers();
        self.inner
            .completion
            .toggle(&known, tracker_id, day, mark_complete)
    }

    /// Creates or replaces the tracker described by `draft`, creating its
    /// category on demand.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub fn save_draft(&self, draft: &TrackerDraft) -> Result<Tracker, TrackerError> {
        let (tracker, category) = draft.build()?;
        if draft.is_edit() {
            self.update_tracker(&tracker, &category)?;
        } else {
            self.add_tracker(&tracker, &category)?;
        }
        Ok(tracker)
    }

    pub fn add_tracker(&self, tracker: &Tracker, category_title: &str) -> Result<(), TrackerError> {
        let (title, created) = self.ensure_category(category_title)?;
        let result = self.inner.gateway.create_tracker(tracker, title);
        self.settle_category(title, created, result)?;
        info!(tracker_id = %tracker.id, category = %title, "tracker created");
        Ok(())
    }

    pub fn update_tracker(&self, tracker: &Tracker, category_title: &str) -> Result<(), TrackerError> {
        let (title, created) = self.ensure_category(category_title)?;
        let result = self.inner.gateway.update_tracker(tracker, title);
        self.settle_category(title, created, result)?;
        info!(tracker_id = %tracker.id, category = %title, "tracker updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete_tracker(&self, id: Uuid) -> Result<(), TrackerError> {
        self.inner.gateway.delete_tracker(id)?;
        info!(tracker_id = %id, "tracker deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn create_category(&self, title: &str) -> Result<(), TrackerError> {
        let title = validate_title(title)?;
        if self.inner.gateway.fetch_category(title)?.is_some() {
            return Err(ValidationError::DuplicateCategory(title.to_string()).into());
        }
        self.inner.gateway.create_category(title)?;
        Ok(())
    }

    /// Moves every tracker of `old_title` under `new_title`, then drops the old
    /// one. If a move fails, the trackers already moved go back and the new
    /// category is removed again.
    #[instrument(skip(self))]
    pub fn rename_category(&self, old_title: &str, new_title: &str) -> Result<(), TrackerError> {
        let new_title = validate_title(new_title)?;
        let existing = self
            .inner
            .gateway
            .fetch_category(old_title)?
            .ok_or_else(|| ValidationError::UnknownCategory(old_title.to_string()))?;
        if old_title == new_title {
            return Ok(());
        }
        self.create_category(new_title)?;
        for (moved, tracker) in existing.trackers.iter().enumerate() {
            if let Err(err) = self.inner.gateway.update_tracker(tracker, new_title) {
                warn!(%err, tracker_id = %tracker.id, "rename failed, moving trackers back");
                self.undo_rename(&existing.trackers[..moved], old_title, new_title);
                return Err(err.into());
            }
        }
        self.inner.gateway.delete_category(old_title)?;
        Ok(())
    }

    fn undo_rename(&self, moved: &[Tracker], old_title: &str, new_title: &str) {
        for tracker in moved {
            if let Err(err) = self.inner.gateway.update_tracker(tracker, old_title) {
                warn!(%err, tracker_id = %tracker.id, "could not move tracker back");
                return;
            }
        }
        if let Err(err) = self.inner.gateway.delete_category(new_title) {
            warn!(%err, title = %new_title, "could not remove renamed category");
        }
    }

    /// Deleting a category deletes its trackers and their records in a single
    /// gateway write.
    #[instrument(skip(self))]
    pub fn delete_category(&self, title: &str) -> Result<(), TrackerError> {
        let Some(category) = self.inner.gateway.fetch_category(title)? else {
            return Ok(());
        };
        self.inner.gateway.delete_category(title)?;
        info!(%title, trackers = category.trackers.len(), "category deleted");
        Ok(())
    }

    /// Returns the trimmed title and whether it had to be created.
    fn ensure_category<'t>(&self, title: &'t str) -> Result<(&'t str, bool), TrackerError> {
        let title = validate_title(title)?;
        if self.inner.gateway.fetch_category(title)?.is_some() {
            return Ok((title, false));
        }
        debug!(%title, "creating category on demand");
        self.inner.gateway.create_category(title)?;
        Ok((title, true))
    }

    /// Drops a category created on demand when the tracker write that needed
    /// it failed.
    fn settle_category(
        &self,
        title: &str,
        created: bool,
        result: Result<(), StoreError>,
    ) -> Result<(), TrackerError> {
        let Err(err) = result else {
            return Ok(());
        };
        if created {
            if let Err(cleanup) = self.inner.gateway.delete_category(title) {
                warn!(err = %cleanup, %title, "could not remove category created on demand");
            }
        }
        Err(err.into())
    }
}

impl Drop for TrackerService {
    fn drop(&mut self) {
        self.inner.gateway.unsubscribe(self.subscription);
    }
}

fn validate_title(title: &str) -> Result<&str, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyCategoryTitle);
    }
    Ok(trimmed)
}
