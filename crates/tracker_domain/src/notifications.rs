use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::ChangeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreEntity {
    Trackers,
    Categories,
    Records,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub old_index: usize,
    pub new_index: usize,
}

/// Batched description of a store change. Consumers treat it as a signal to
/// re-fetch, never as an authoritative diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreUpdate {
    pub entity: StoreEntity,
    pub inserted: BTreeSet<usize>,
    pub deleted: BTreeSet<usize>,
    pub updated: BTreeSet<usize>,
    pub moved: BTreeSet<Move>,
}

impl StoreUpdate {
    pub fn empty(entity: StoreEntity) -> Self {
        Self {
            entity,
            inserted: BTreeSet::new(),
            deleted: BTreeSet::new(),
            updated: BTreeSet::new(),
            moved: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
            && self.deleted.is_empty()
            && self.updated.is_empty()
            && self.moved.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Delete,
    Update,
    Move,
}

/// A single per-object change as reported by a storage engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChange {
    pub kind: ChangeKind,
    pub index: Option<usize>,
    pub new_index: Option<usize>,
}

impl RawChange {
    pub fn insert(new_index: usize) -> Self {
        Self {
            kind: ChangeKind::Insert,
            index: None,
            new_index: Some(new_index),
        }
    }

    pub fn delete(index: usize) -> Self {
        Self {
            kind: ChangeKind::Delete,
            index: Some(index),
            new_index: None,
        }
    }

    pub fn update(index: usize) -> Self {
        Self {
            kind: ChangeKind::Update,
            index: Some(index),
            new_index: None,
        }
    }

    pub fn moved(index: usize, new_index: usize) -> Self {
        Self {
            kind: ChangeKind::Move,
            index: Some(index),
            new_index: Some(new_index),
        }
    }
}

/// Accumulates raw changes between `begin` and `finish`. Malformed changes
/// are reported and skipped instead of aborting the batch.
#[derive(Debug)]
pub struct ChangeRecorder {
    entity: StoreEntity,
    pending: Option<StoreUpdate>,
    rejected: Vec<ChangeError>,
}

impl ChangeRecorder {
    pub fn new(entity: StoreEntity) -> Self {
        Self {
            entity,
            pending: None,
            rejected: Vec::new(),
        }
    }

    pub fn begin(&mut self) {
        self.pending = Some(StoreUpdate::empty(self.entity));
        self.rejected.clear();
    }

    pub fn record(&mut self, change: RawChange) -> Result<(), ChangeError> {
        let result = self.apply(change);
        if let Err(err) = &result {
            tracing::warn!(entity = ?self.entity, ?change, %err, "inconsistent store change");
            self.rejected.push(err.clone());
        }
        result
    }

    fn apply(&mut self, change: RawChange) -> Result<(), ChangeError> {
        if self.pending.is_none() {
            // changes outside a batch open one implicitly
            self.begin();
        }
        let Some(update) = self.pending.as_mut() else {
            return Ok(());
        };
        match change.kind {
            ChangeKind::Insert => {
                let index = change.new_index.ok_or(ChangeError::InsertWithoutIndex)?;
                update.inserted.insert(index);
            }
            ChangeKind::Delete => {
                let index = change.index.ok_or(ChangeError::DeleteWithoutIndex)?;
                update.deleted.insert(index);
            }
            ChangeKind::Update => {
                let index = change.index.ok_or(ChangeError::UpdateWithoutIndex)?;
                update.updated.insert(index);
            }
            ChangeKind::Move => match (change.index, change.new_index) {
                (Some(old_index), Some(new_index)) => {
                    update.moved.insert(Move {
                        old_index,
                        new_index,
                    });
                }
                _ => return Err(ChangeError::MoveWithoutIndexes),
            },
        }
        Ok(())
    }

    /// Closes the batch. Returns `None` when nothing was begun.
    pub fn finish(&mut self) -> Option<StoreUpdate> {
        self.pending.take()
    }

    pub fn rejected(&self) -> &[ChangeError] {
        &self.rejected
    }
}

/// Subscriber to store changes. Each write is delivered as one batch with an
/// update per affected entity. Invoked on the caller's thread after the store
/// has released its locks, so it may query the store again.
pub trait StoreObserver: Send + Sync {
    fn store_did_change(&self, batch: &[StoreUpdate]);
}

impl<F> StoreObserver for F
where
    F: Fn(&[StoreUpdate]) + Send + Sync,
{
    fn store_did_change(&self, batch: &[StoreUpdate]) {
        self(batch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Positional diff between two orderings of keyed values. A key present in
/// both with a different value counts as updated.
pub fn diff_positions<'a, K, V>(
    entity: StoreEntity,
    before: &'a [(K, V)],
    after: &'a [(K, V)],
) -> StoreUpdate
where
    K: Eq + Hash + 'a,
    V: PartialEq,
{
    diff_by(
        entity,
        before,
        after,
        |entry: &'a (K, V)| &entry.0,
        |old, new| old.1 == new.1,
    )
}

/// Positional diff of bare keys; only inserts, deletes and moves.
pub fn diff_keys<'a, K>(entity: StoreEntity, before: &'a [K], after: &'a [K]) -> StoreUpdate
where
    K: Eq + Hash + 'a,
{
    diff_by(entity, before, after, |key: &'a K| key, |_, _| true)
}

fn diff_by<'a, T, K>(
    entity: StoreEntity,
    before: &'a [T],
    after: &'a [T],
    key: impl Fn(&'a T) -> &'a K,
    unchanged: impl Fn(&T, &T) -> bool,
) -> StoreUpdate
where
    K: Eq + Hash + 'a,
{
    let old_positions: HashMap<&K, usize> = before
        .iter()
        .enumerate()
        .map(|(index, item)| (key(item), index))
        .collect();
    let new_positions: HashMap<&K, usize> = after
        .iter()
        .enumerate()
        .map(|(index, item)| (key(item), index))
        .collect();

    let mut recorder = ChangeRecorder::new(entity);
    recorder.begin();
    for (old_index, item) in before.iter().enumerate() {
        match new_positions.get(key(item)) {
            None => {
                let _ = recorder.record(RawChange::delete(old_index));
            }
            Some(&new_index) => {
                if new_index != old_index {
                    let _ = recorder.record(RawChange::moved(old_index, new_index));
                }
                if !unchanged(item, &after[new_index]) {
                    let _ = recorder.record(RawChange::update(old_index));
                }
            }
        }
    }
    for (new_index, item) in after.iter().enumerate() {
        if !old_positions.contains_key(key(item)) {
            let _ = recorder.record(RawChange::insert(new_index));
        }
    }
    recorder
        .finish()
        .unwrap_or_else(|| StoreUpdate::empty(entity))
}
