use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use parking_lot::Mutex;
use tracker_domain::error::StoreResult;
use tracker_domain::notifications::{StoreObserver, SubscriptionId};
use tracker_domain::completion::CompletionOutcome;
use tracker_domain::draft::TrackerDraft;
use tracker_domain::filter::FilterMode;
use tracker_domain::schedule::FixedClock;
use tracker_domain::service::{EmptyState, VisibleSnapshot};
use tracker_domain::tracker::{
    Tracker, TrackerCategory, TrackerColor, TrackerRecord, EMOJIS, PALETTE,
};
use tracker_domain::weekday::{Schedule, Weekday};
use uuid::Uuid;
use tracker_domain::{
    CompletionRejected, MemoryStore, StoreError, TrackerError, TrackerGateway, TrackerService,
    ValidationError,
};

// 2025-11-03 is a Monday
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 3).expect("valid date")
}

struct Harness {
    store: Arc<MemoryStore>,
    clock: Arc<FixedClock>,
    service: TrackerService,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(monday()));
    let service = TrackerService::builder(store.clone())
        .with_clock(clock.clone())
        .build()
        .expect("build tracker service");
    Harness {
        store,
        clock,
        service,
    }
}

fn habit(name: &str, category: &str, days: &[Weekday]) -> TrackerDraft {
    TrackerDraft::habit()
        .with_name(name)
        .with_color(TrackerColor::from_hex(PALETTE[3]).expect("palette color"))
        .with_emoji(EMOJIS[3])
        .with_schedule(Schedule::new(days.iter().copied()))
        .with_category(category)
}

fn event(name: &str, category: &str) -> TrackerDraft {
    TrackerDraft::irregular_event()
        .with_name(name)
        .with_color(TrackerColor::from_hex(PALETTE[9]).expect("palette color"))
        .with_emoji(EMOJIS[9])
        .with_category(category)
}

fn visible_names(snapshot: &VisibleSnapshot) -> Vec<String> {
    snapshot.trackers().map(|tracker| tracker.name.clone()).collect()
}

#[test]
fn search_narrows_visible_categories() {
    let h = harness();
    h.service
        .save_draft(&habit("Drink water", "Health", &[Weekday::Monday]))
        .expect("save water");
    h.service
        .save_draft(&habit("Inbox zero", "Work", &[Weekday::Monday]))
        .expect("save inbox");

    assert_eq!(h.service.snapshot().categories.len(), 2);

    h.service.set_search("WATER");
    let snapshot = h.service.snapshot();
    assert_eq!(snapshot.categories.len(), 1);
    assert_eq!(snapshot.categories[0].title, "Health");
    assert_eq!(visible_names(&snapshot), vec!["Drink water"]);
    assert_eq!(snapshot.empty_state(), EmptyState::Content);

    h.service.set_search("gym");
    let snapshot = h.service.snapshot();
    assert!(snapshot.categories.is_empty());
    assert!(snapshot.has_due_trackers);
    assert_eq!(snapshot.empty_state(), EmptyState::NothingFound);
}

#[test]
fn habits_follow_their_weekdays() {
    let h = harness();
    let tracker = h
        .service
        .save_draft(&habit("Gym", "Sport", &[Weekday::Monday, Weekday::Wednesday]))
        .expect("save gym");

    assert_eq!(visible_names(&h.service.snapshot()), vec!["Gym"]);

    let tuesday = monday() + Duration::days(1);
    h.service.set_date(tuesday);
    let snapshot = h.service.snapshot();
    assert!(snapshot.categories.is_empty());
    assert_eq!(snapshot.empty_state(), EmptyState::NoTrackers);

    let err = h
        .service
        .toggle_completion(tracker.id, tuesday, true)
        .expect_err("tuesday is not scheduled");
    assert_eq!(
        err,
        TrackerError::Rejected(CompletionRejected::NotScheduled {
            weekday: Weekday::Tuesday
        })
    );

    let wednesday = monday() + Duration::days(2);
    h.service.set_date(wednesday);
    assert_eq!(visible_names(&h.service.snapshot()), vec!["Gym"]);
    assert!(matches!(
        h.service.toggle_completion(tracker.id, wednesday, true),
        Err(TrackerError::Rejected(CompletionRejected::FutureDate { .. }))
    ));

    h.clock.set(wednesday);
    assert_eq!(
        h.service
            .toggle_completion(tracker.id, wednesday, true)
            .expect("wednesday is today now"),
        CompletionOutcome::Recorded
    );
    assert!(h.service.is_completed(tracker.id, wednesday));
}

#[test]
fn irregular_events_show_and_complete_only_today() {
    let h = harness();
    let tracker = h
        .service
        .save_draft(&event("Visit the dentist", "Errands"))
        .expect("save event");
    assert!(tracker.is_irregular());

    assert_eq!(visible_names(&h.service.snapshot()), vec!["Visit the dentist"]);

    let yesterday = monday() - Duration::days(1);
    h.service.set_date(yesterday);
    assert!(h.service.snapshot().categories.is_empty());
    assert!(matches!(
        h.service.toggle_completion(tracker.id, yesterday, true),
        Err(TrackerError::Rejected(
            CompletionRejected::IrregularEventNotToday { .. }
        ))
    ));

    assert_eq!(
        h.service
            .toggle_completion(tracker.id, monday(), true)
            .expect("complete today"),
        CompletionOutcome::Recorded
    );
    assert_eq!(h.service.completed_days(tracker.id), 1);
}

#[test]
fn completion_filters_partition_the_day() {
    let h = harness();
    let water = h
        .service
        .save_draft(&habit("Drink water", "Health", &[Weekday::Monday]))
        .expect("save water");
    h.service
        .save_draft(&habit("Stretch", "Health", &[Weekday::Monday]))
        .expect("save stretch");
    h.service
        .toggle_completion(water.id, monday(), true)
        .expect("complete water");

    h.service.set_filter(FilterMode::Completed);
    assert_eq!(visible_names(&h.service.snapshot()), vec!["Drink water"]);

    h.service.set_filter(FilterMode::Incomplete);
    assert_eq!(visible_names(&h.service.snapshot()), vec!["Stretch"]);

    h.service
        .toggle_completion(water.id, monday(), false)
        .expect("uncomplete water");
    assert_eq!(
        visible_names(&h.service.snapshot()),
        vec!["Drink water", "Stretch"]
    );
}

#[test]
fn trackers_today_moves_the_date_back() {
    let h = harness();
    h.service.set_date(monday() - Duration::days(4));
    h.service.set_filter(FilterMode::TrackersToday);
    assert_eq!(h.service.date(), monday());
    assert_eq!(h.service.filter_mode(), FilterMode::TrackersToday);

    h.service.set_date(monday() - Duration::days(1));
    assert_eq!(h.service.filter_mode(), FilterMode::TrackersToday);
}

#[test]
fn deleting_a_tracker_removes_its_records() {
    let h = harness();
    let tracker = h
        .service
        .save_draft(&habit("Read", "Study", &Weekday::ALL))
        .expect("save read");
    h.service
        .toggle_completion(tracker.id, monday(), true)
        .expect("complete today");
    h.service
        .toggle_completion(tracker.id, monday() - Duration::days(1), true)
        .expect("complete yesterday");
    assert_eq!(h.service.completed_days(tracker.id), 2);

    h.service.delete_tracker(tracker.id).expect("delete");

    assert!(h.service.trackers().is_empty());
    assert!(h.store.fetch_all_records().expect("records").is_empty());
    assert_eq!(h.service.completed_days(tracker.id), 0);
    assert!(h.service.snapshot().categories.is_empty());
}

#[test]
fn editing_keeps_identity_and_can_move_category() {
    let h = harness();
    let tracker = h
        .service
        .save_draft(&habit("Read", "Study", &[Weekday::Monday]))
        .expect("save read");
    h.service
        .toggle_completion(tracker.id, monday(), true)
        .expect("complete");

    let (current, category) = h.service.tracker(tracker.id).expect("known tracker");
    let edited = TrackerDraft::for_edit(&current, &category)
        .with_name("Read a chapter")
        .with_category("Evening");
    h.service.save_draft(&edited).expect("save edit");

    let (updated, category) = h.service.tracker(tracker.id).expect("still known");
    assert_eq!(updated.name, "Read a chapter");
    assert_eq!(category, "Evening");
    assert!(h.service.is_completed(tracker.id, monday()));
    assert_eq!(h.service.category_titles(), vec!["Evening", "Study"]);
}

#[test]
fn categories_are_unique_and_renames_carry_trackers() {
    let h = harness();
    h.service.create_category("Health").expect("create");
    assert_eq!(
        h.service.create_category("Health"),
        Err(ValidationError::DuplicateCategory("Health".into()).into())
    );
    assert_eq!(
        h.service.create_category("   "),
        Err(ValidationError::EmptyCategoryTitle.into())
    );

    let tracker = h
        .service
        .save_draft(&habit("Walk", "Health", &[Weekday::Monday]))
        .expect("save walk");
    h.service
        .rename_category("Health", "Wellbeing")
        .expect("rename");
    assert_eq!(h.service.category_titles(), vec!["Wellbeing"]);
    assert_eq!(
        h.service.tracker(tracker.id).map(|(_, title)| title),
        Some("Wellbeing".to_string())
    );

    h.service.delete_category("Wellbeing").expect("delete");
    assert!(h.service.categories().is_empty());
    assert!(h.service.trackers().is_empty());
}

#[test]
fn observers_receive_fresh_projections() {
    let h = harness();
    let calls = Arc::new(AtomicUsize::new(0));
    let last: Arc<Mutex<Option<VisibleSnapshot>>> = Arc::new(Mutex::new(None));
    {
        let calls = calls.clone();
        let last = last.clone();
        h.service.add_observer(Box::new(move |snapshot: &VisibleSnapshot| {
            calls.fetch_add(1, Ordering::SeqCst);
            *last.lock() = Some(snapshot.clone());
        }));
    }

    let tracker = h
        .service
        .save_draft(&habit("Meditate", "Mind", &[Weekday::Monday]))
        .expect("save");
    assert!(calls.load(Ordering::SeqCst) > 0);
    let seen = last.lock().clone().expect("observer ran");
    assert_eq!(visible_names(&seen), vec!["Meditate"]);

    // Writes made behind the service's back still reach it.
    h.store.delete_tracker(tracker.id).expect("direct delete");
    let seen = last.lock().clone().expect("observer ran");
    assert!(seen.categories.is_empty());
    assert!(h.service.trackers().is_empty());
}

#[test]
fn gateway_failures_propagate_and_change_nothing() {
    let h = harness();
    let tracker = h
        .service
        .save_draft(&habit("Journal", "Mind", &[Weekday::Monday]))
        .expect("save");

    h.store.set_failing(true);
    let err = h
        .service
        .toggle_completion(tracker.id, monday(), true)
        .expect_err("store is failing");
    assert!(matches!(err, TrackerError::Store(StoreError::Save(_))));
    assert!(!h.service.is_completed(tracker.id, monday()));

    h.store.set_failing(false);
    h.service
        .toggle_completion(tracker.id, monday(), true)
        .expect("store recovered");
    assert!(h.service.is_completed(tracker.id, monday()));
}

#[test]
fn statistics_reflect_completions() {
    let h = harness();
    let tracker = h
        .service
        .save_draft(&habit("Run", "Sport", &Weekday::ALL))
        .expect("save");
    assert!(h.service.statistics().is_empty());
    for offset in 0..3 {
        h.service
            .toggle_completion(tracker.id, monday() - Duration::days(offset), true)
            .expect("complete");
    }
    let stats = h.service.statistics();
    assert_eq!(stats.completed_trackers, 3);
    assert_eq!(stats.best_period, 3);
    assert_eq!(stats.perfect_days, 3);
}

#[test]
fn restored_snapshots_rebuild_the_same_view() {
    let h = harness();
    h.service
        .save_draft(&habit("Drink water", "Health", &[Weekday::Monday]))
        .expect("save");
    let restored = Arc::new(MemoryStore::from_snapshot(&h.store.snapshot()));
    let service = TrackerService::builder(restored)
        .with_clock(h.clock.clone())
        .build()
        .expect("rebuild");
    let names: Vec<String> = service.trackers().into_iter().map(|t: Tracker| t.name).collect();
    assert_eq!(names, vec!["Drink water"]);
}

#[test]
fn padded_category_titles_are_saved_trimmed() {
    let h = harness();
    let draft = habit("Stretch", " Health ", &[Weekday::Monday]);
    assert!(draft.is_complete());
    let tracker = h.service.save_draft(&draft).expect("save");
    assert_eq!(h.service.category_titles(), vec!["Health"]);
    assert_eq!(
        h.service.tracker(tracker.id).map(|(_, title)| title),
        Some("Health".to_string())
    );
}

#[test]
fn failed_tracker_write_drops_the_category_it_created() {
    let h = harness();
    let tracker = h
        .service
        .save_draft(&habit("Walk", "Health", &[Weekday::Monday]))
        .expect("save walk");

    let err = h
        .service
        .add_tracker(&tracker, "Other")
        .expect_err("tracker already exists");
    assert!(matches!(err, TrackerError::Store(StoreError::Save(_))));
    assert_eq!(h.service.category_titles(), vec!["Health"]);
}

#[test]
fn observers_may_write_back_through_the_store() {
    let h = harness();
    let fired = Arc::new(AtomicBool::new(false));
    {
        let store = h.store.clone();
        let fired = fired.clone();
        h.service.add_observer(Box::new(move |_: &VisibleSnapshot| {
            if !fired.swap(true, Ordering::SeqCst) {
                store.create_category("Inbox").expect("create from observer");
            }
        }));
    }

    h.service.set_search("x");
    assert!(fired.load(Ordering::SeqCst));
    assert_eq!(h.service.category_titles(), vec!["Inbox"]);
}

/// Delegates to a `MemoryStore` but rejects one `update_tracker` call.
struct FlakyUpdates {
    store: Arc<MemoryStore>,
    updates: AtomicUsize,
    fail_on: usize,
}

impl TrackerGateway for FlakyUpdates {
    fn create_tracker(&self, tracker: &Tracker, category_title: &str) -> StoreResult<()> {
        self.store.create_tracker(tracker, category_title)
    }

    fn update_tracker(&self, tracker: &Tracker, category_title: &str) -> StoreResult<()> {
        if self.updates.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
            return Err(StoreError::Save("update rejected".into()));
        }
        self.store.update_tracker(tracker, category_title)
    }

    fn delete_tracker(&self, id: Uuid) -> StoreResult<()> {
        self.store.delete_tracker(id)
    }

    fn fetch_all_trackers(&self) -> StoreResult<Vec<Tracker>> {
        self.store.fetch_all_trackers()
    }

    fn create_category(&self, title: &str) -> StoreResult<()> {
        self.store.create_category(title)
    }

    fn fetch_category(&self, title: &str) -> StoreResult<Option<TrackerCategory>> {
        self.store.fetch_category(title)
    }

    fn delete_category(&self, title: &str) -> StoreResult<()> {
        self.store.delete_category(title)
    }

    fn fetch_all_categories(&self) -> StoreResult<Vec<TrackerCategory>> {
        self.store.fetch_all_categories()
    }

    fn create_record(&self, tracker_id: Uuid, day: NaiveDate) -> StoreResult<()> {
        self.store.create_record(tracker_id, day)
    }

    fn delete_record(&self, tracker_id: Uuid, day: NaiveDate) -> StoreResult<()> {
        self.store.delete_record(tracker_id, day)
    }

    fn fetch_all_records(&self) -> StoreResult<Vec<TrackerRecord>> {
        self.store.fetch_all_records()
    }

    fn subscribe(&self, observer: Arc<dyn StoreObserver>) -> SubscriptionId {
        self.store.subscribe(observer)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.store.unsubscribe(id)
    }
}

#[test]
fn interrupted_rename_moves_trackers_back() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(FlakyUpdates {
        store: store.clone(),
        updates: AtomicUsize::new(0),
        fail_on: 2,
    });
    let service = TrackerService::builder(gateway)
        .with_clock(Arc::new(FixedClock::new(monday())))
        .build()
        .expect("build tracker service");
    let walk = service
        .save_draft(&habit("Walk", "Health", &[Weekday::Monday]))
        .expect("save walk");
    let water = service
        .save_draft(&event("Water", "Health"))
        .expect("save water");

    let err = service
        .rename_category("Health", "Wellbeing")
        .expect_err("second move fails");
    assert!(matches!(err, TrackerError::Store(StoreError::Save(_))));
    assert_eq!(service.category_titles(), vec!["Health"]);
    for id in [walk.id, water.id] {
        assert_eq!(
            service.tracker(id).map(|(_, title)| title),
            Some("Health".to_string())
        );
    }
    assert_eq!(store.fetch_category("Wellbeing").expect("fetch"), None);
}
