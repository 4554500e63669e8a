//! Fractional ordering for drag-and-drop reordering
//!
//! Items carry a floating point sort key. Moving an item computes a single new
//! key between its new neighbours, so the rest of the list keeps its stored
//! keys and only one write reaches storage. When the gap between neighbours
//! has narrowed below [`OrderingConfig::min_gap`] the list is rebalanced to
//! evenly spaced keys instead.

use crate::config::OrderingConfig;
use crate::error::{ConsoleError, Result};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, warn};

/// An entity that can be placed in a user-ordered list
pub trait OrderedItem {
    type Id: Clone + Eq + Ord + fmt::Display + Send + Sync;

    fn id(&self) -> &Self::Id;

    fn sort_key(&self) -> f64;

    fn set_sort_key(&mut self, key: f64);
}

/// A single drop event: move `moved_id` to `target_index` in display order
///
/// The target index is interpreted after the moved item has been taken out
/// of the list, which is how drag-and-drop libraries report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderRequest<Id> {
    pub moved_id: Id,
    pub target_index: usize,
}

impl<Id> ReorderRequest<Id> {
    pub fn new(moved_id: Id, target_index: usize) -> Self {
        Self {
            moved_id,
            target_index,
        }
    }
}

/// Outcome of planning a reorder
#[derive(Debug, Clone, PartialEq)]
pub enum Placement<Id> {
    /// The item was dropped where it already is
    Unchanged,
    /// Only the moved item gets a new key
    Single { id: Id, key: f64 },
    /// Every item gets a fresh, evenly spaced key, listed in display order
    Rebalanced { keys: Vec<(Id, f64)> },
}

/// Compares two items by sort key, falling back to id for equal keys
pub fn compare_items<T: OrderedItem>(a: &T, b: &T) -> Ordering {
    a.sort_key()
        .total_cmp(&b.sort_key())
        .then_with(|| a.id().cmp(b.id()))
}

/// Computes the key for a slot between two optional neighbours
///
/// * head of the list: half of the next key, or `head_key` for an empty list
/// * tail of the list: previous key plus one
/// * between two items: the midpoint
///
/// Halving only moves a key towards the front while it is positive, so a
/// non-positive next key falls back to `next - 1`.
pub fn key_between(prev: Option<f64>, next: Option<f64>, head_key: f64) -> f64 {
    match (prev, next) {
        (None, None) => head_key,
        (None, Some(next)) => {
            let half = next / 2.0;
            if half < next {
                half
            } else {
                next - 1.0
            }
        }
        (Some(prev), None) => prev + 1.0,
        (Some(prev), Some(next)) => (prev + next) / 2.0,
    }
}

/// Checks that `key` sorts strictly between its neighbours with room to spare
fn fits_between(prev: Option<f64>, key: f64, next: Option<f64>, min_gap: f64) -> bool {
    if !key.is_finite() {
        return false;
    }
    let after_prev = prev.map_or(true, |p| key > p && key - p >= min_gap);
    let before_next = next.map_or(true, |n| key < n && n - key >= min_gap);
    after_prev && before_next
}

/// Plans the key change for a reorder without touching the items
///
/// `items` must already be in display order. Fails with
/// [`ConsoleError::ItemNotFound`] when the moved id is absent and with
/// [`ConsoleError::InvalidTargetIndex`] when the target is past the end.
pub fn plan_reorder<T: OrderedItem>(
    items: &[T],
    request: &ReorderRequest<T::Id>,
    config: &OrderingConfig,
) -> Result<Placement<T::Id>> {
    let from = items
        .iter()
        .position(|item| item.id() == &request.moved_id)
        .ok_or_else(|| ConsoleError::ItemNotFound(request.moved_id.to_string()))?;

    let to = request.target_index;
    if to >= items.len() {
        return Err(ConsoleError::InvalidTargetIndex {
            index: to,
            len: items.len(),
        });
    }

    if from == to {
        return Ok(Placement::Unchanged);
    }

    let mut order: Vec<usize> = (0..items.len()).collect();
    let moved = order.remove(from);
    order.insert(to, moved);

    let prev = to
        .checked_sub(1)
        .map(|i| items[order[i]].sort_key());
    let next = order.get(to + 1).map(|&i| items[i].sort_key());
    let key = key_between(prev, next, config.head_key);

    if fits_between(prev, key, next, config.min_gap) {
        debug!(
            id = %request.moved_id,
            from,
            to,
            ?prev,
            ?next,
            key,
            "Computed fractional sort key"
        );
        return Ok(Placement::Single {
            id: request.moved_id.clone(),
            key,
        });
    }

    warn!(
        id = %request.moved_id,
        ?prev,
        ?next,
        key,
        "Sort key gap exhausted, rebalancing list"
    );
    let keys = order
        .iter()
        .enumerate()
        .map(|(position, &i)| {
            (
                items[i].id().clone(),
                (position + 1) as f64 * config.rebalance_step,
            )
        })
        .collect();
    Ok(Placement::Rebalanced { keys })
}

/// A reorder that has been applied in memory and still has to be persisted
///
/// Holds the writes to send to storage and a shadow copy of every key as it
/// was before the change, so a failed write can be undone exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderCommand<Id> {
    moved_id: Id,
    writes: Vec<(Id, f64)>,
    previous_keys: Vec<(Id, f64)>,
    rebalanced: bool,
}

impl<Id: Clone + Eq> ReorderCommand<Id> {
    pub fn moved_id(&self) -> &Id {
        &self.moved_id
    }

    /// Keys to persist, moved item first
    pub fn writes(&self) -> &[(Id, f64)] {
        &self.writes
    }

    pub fn is_rebalance(&self) -> bool {
        self.rebalanced
    }

    /// The key an item had before this command was applied
    pub fn previous_key(&self, id: &Id) -> Option<f64> {
        self.previous_keys
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, key)| *key)
    }
}

/// An in-memory list kept sorted by sort key
#[derive(Debug, Clone)]
pub struct OrderedCollection<T: OrderedItem> {
    items: Vec<T>,
    config: OrderingConfig,
}

impl<T: OrderedItem> OrderedCollection<T> {
    pub fn new(mut items: Vec<T>, config: OrderingConfig) -> Self {
        items.sort_by(compare_items);
        Self { items, config }
    }

    /// Items in display order
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn ids(&self) -> Vec<T::Id> {
        self.items.iter().map(|item| item.id().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Adds an item at the place its key dictates
    pub fn insert(&mut self, item: T) {
        let at = self
            .items
            .partition_point(|existing| compare_items(existing, &item) == Ordering::Less);
        self.items.insert(at, item);
    }

    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        self.position(id).map(|at| self.items.remove(at))
    }

    /// Key for an item appended after the current last one
    pub fn next_key(&self) -> f64 {
        key_between(
            self.items.last().map(|item| item.sort_key()),
            None,
            self.config.head_key,
        )
    }

    /// Applies a reorder in memory
    ///
    /// Returns `None` when the item was dropped in place. Otherwise the list
    /// is re-sorted with the new key(s) and the returned command describes
    /// what to persist and how to undo it.
    pub fn apply(
        &mut self,
        request: &ReorderRequest<T::Id>,
    ) -> Result<Option<ReorderCommand<T::Id>>> {
        let placement = plan_reorder(&self.items, request, &self.config)?;
        let previous_keys: Vec<(T::Id, f64)> = self
            .items
            .iter()
            .map(|item| (item.id().clone(), item.sort_key()))
            .collect();

        let (writes, rebalanced) = match placement {
            Placement::Unchanged => return Ok(None),
            Placement::Single { id, key } => {
                if let Some(item) = self.items.iter_mut().find(|item| item.id() == &id) {
                    item.set_sort_key(key);
                }
                (vec![(id, key)], false)
            }
            Placement::Rebalanced { keys } => {
                let mut writes = Vec::new();
                for (id, key) in keys {
                    if let Some(item) = self.items.iter_mut().find(|item| item.id() == &id) {
                        if item.sort_key() != key {
                            item.set_sort_key(key);
                            writes.push((id, key));
                        }
                    }
                }
                // Moved item first so single-write consumers see it at the head
                if let Some(at) = writes.iter().position(|(id, _)| id == &request.moved_id) {
                    let moved = writes.remove(at);
                    writes.insert(0, moved);
                }
                (writes, true)
            }
        };

        self.items.sort_by(compare_items);

        Ok(Some(ReorderCommand {
            moved_id: request.moved_id.clone(),
            writes,
            previous_keys,
            rebalanced,
        }))
    }

    /// Restores every key captured by `command` and re-sorts
    pub fn revert(&mut self, command: &ReorderCommand<T::Id>) {
        for (id, key) in &command.previous_keys {
            if let Some(item) = self.items.iter_mut().find(|item| item.id() == id) {
                if item.sort_key().to_bits() != key.to_bits() {
                    item.set_sort_key(*key);
                }
            }
        }
        self.items.sort_by(compare_items);
    }
}
