//! Collaborator interfaces: where data and size estimates come from.
//!
//! The list never owns item data or knows how items look. It asks a
//! [`DataProvider`] for counts, identities and change detection, and a
//! [`LayoutTypeProvider`] for item types and estimated sizes. In-memory
//! implementations are provided for hosts that keep their rows in a `Vec`.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::geometry::Dimension;

/// Item type identifier. Views are only recycled between items of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemType(u32);

impl ItemType {
    /// Create a type from its raw identifier.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw identifier.
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Source of item data for the list.
///
/// A new provider value handed to the list is treated as a data change.
/// `first_index_to_process` tells the list where relayout must begin.
pub trait DataProvider {
    /// Row type.
    type Item;

    /// Number of items.
    fn size(&self) -> usize;

    /// Item at `index`, if any.
    fn data_at(&self, index: usize) -> Option<&Self::Item>;

    /// Stable identity of the item at `index`; defaults to the index itself.
    fn stable_id(&self, index: usize) -> String {
        index.to_string()
    }

    /// True when two rows should be treated as different content.
    fn has_changed(&self, a: &Self::Item, b: &Self::Item) -> bool;

    /// True when `stable_id` survives reordering (not index based).
    fn has_stable_ids(&self) -> bool {
        false
    }

    /// First index whose content changed relative to the previous provider.
    fn first_index_to_process(&self) -> usize {
        0
    }

    /// True when existing rows changed (not a pure append), so the render
    /// stack must be re-keyed and the anchor shifted.
    fn requires_data_change_handling(&self) -> bool {
        false
    }
}

/// Maps indexes to item types and estimated sizes.
pub trait LayoutTypeProvider {
    /// Item type of `index`. `None` is a contract violation.
    fn type_for_index(&self, index: usize) -> Option<ItemType>;

    /// Estimated size of an item of `item_type` at `index`.
    fn estimate_for(&self, item_type: ItemType, index: usize) -> Dimension;

    /// Keep the first visible item in place when this provider replaces another.
    fn should_refresh_with_anchoring(&self) -> bool {
        true
    }
}

type ChangeFn<T> = Rc<dyn Fn(&T, &T) -> bool>;
type StableIdFn<T> = Rc<dyn Fn(usize, &T) -> String>;

/// Data provider over an immutable, shared `Vec`.
///
/// New versions are derived with [`VecDataProvider::clone_with_rows`], which
/// computes the first changed index by comparing rows pairwise.
pub struct VecDataProvider<T> {
    rows: Rc<Vec<T>>,
    has_changed: ChangeFn<T>,
    stable_id: Option<StableIdFn<T>>,
    first_index_to_process: usize,
    requires_data_change_handling: bool,
}

impl<T> Clone for VecDataProvider<T> {
    fn clone(&self) -> Self {
        Self {
            rows: Rc::clone(&self.rows),
            has_changed: Rc::clone(&self.has_changed),
            stable_id: self.stable_id.clone(),
            first_index_to_process: self.first_index_to_process,
            requires_data_change_handling: self.requires_data_change_handling,
        }
    }
}

impl<T> fmt::Debug for VecDataProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecDataProvider")
            .field("size", &self.rows.len())
            .field("has_stable_ids", &self.stable_id.is_some())
            .field("first_index_to_process", &self.first_index_to_process)
            .field("requires_data_change_handling", &self.requires_data_change_handling)
            .finish()
    }
}

impl<T> VecDataProvider<T> {
    /// Create an empty provider with the given change predicate.
    pub fn new(has_changed: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self {
            rows: Rc::new(Vec::new()),
            has_changed: Rc::new(has_changed),
            stable_id: None,
            first_index_to_process: 0,
            requires_data_change_handling: false,
        }
    }

    /// Use `stable_id` for item identity instead of the index.
    pub fn with_stable_ids(mut self, stable_id: impl Fn(usize, &T) -> String + 'static) -> Self {
        self.stable_id = Some(Rc::new(stable_id));
        self
    }

    /// Derive a new provider holding `rows`.
    ///
    /// The first changed index is the first position where the old and new
    /// rows differ according to the change predicate, or the old length when
    /// the new rows only append.
    pub fn clone_with_rows(&self, rows: Vec<T>) -> Self {
        let shared = rows.len().min(self.rows.len());
        let first_changed = (0..shared)
            .find(|&i| (self.has_changed)(&self.rows[i], &rows[i]))
            .unwrap_or(shared);
        self.derive(rows, first_changed)
    }

    /// Derive a new provider holding `rows`, trusting the caller's first modified index.
    pub fn clone_with_rows_from(&self, rows: Vec<T>, first_modified_index: usize) -> Self {
        let first_changed = first_modified_index.min(self.rows.len());
        self.derive(rows, first_changed)
    }

    fn derive(&self, rows: Vec<T>, first_changed: usize) -> Self {
        Self {
            requires_data_change_handling: first_changed != self.rows.len(),
            rows: Rc::new(rows),
            has_changed: Rc::clone(&self.has_changed),
            stable_id: self.stable_id.clone(),
            first_index_to_process: first_changed,
        }
    }

    /// All rows.
    pub fn rows(&self) -> &[T] {
        &self.rows
    }
}

impl<T> DataProvider for VecDataProvider<T> {
    type Item = T;

    fn size(&self) -> usize {
        self.rows.len()
    }

    fn data_at(&self, index: usize) -> Option<&T> {
        self.rows.get(index)
    }

    fn stable_id(&self, index: usize) -> String {
        match (&self.stable_id, self.rows.get(index)) {
            (Some(f), Some(row)) => f(index, row),
            _ => index.to_string(),
        }
    }

    fn has_changed(&self, a: &T, b: &T) -> bool {
        (self.has_changed)(a, b)
    }

    fn has_stable_ids(&self) -> bool {
        self.stable_id.is_some()
    }

    fn first_index_to_process(&self) -> usize {
        self.first_index_to_process
    }

    fn requires_data_change_handling(&self) -> bool {
        self.requires_data_change_handling
    }
}

type TypeFn = Box<dyn Fn(usize) -> Option<ItemType>>;
type EstimateFn = Box<dyn Fn(ItemType, usize) -> Dimension>;

/// Closure-backed [`LayoutTypeProvider`].
pub struct LayoutProvider {
    type_for_index: TypeFn,
    estimate: EstimateFn,
    refresh_with_anchoring: bool,
}

impl fmt::Debug for LayoutProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutProvider")
            .field("refresh_with_anchoring", &self.refresh_with_anchoring)
            .finish_non_exhaustive()
    }
}

impl LayoutProvider {
    /// Create a provider from a type function and an estimate function.
    pub fn new(
        type_for_index: impl Fn(usize) -> Option<ItemType> + 'static,
        estimate: impl Fn(ItemType, usize) -> Dimension + 'static,
    ) -> Self {
        Self {
            type_for_index: Box::new(type_for_index),
            estimate: Box::new(estimate),
            refresh_with_anchoring: true,
        }
    }

    /// Every index has the default type and the same estimated size.
    pub fn uniform(size: Dimension) -> Self {
        Self::new(|_| Some(ItemType::default()), move |_, _| size)
    }

    /// Refresh without anchoring the first visible item when swapped in.
    pub fn without_anchoring(mut self) -> Self {
        self.refresh_with_anchoring = false;
        self
    }
}

impl LayoutTypeProvider for LayoutProvider {
    fn type_for_index(&self, index: usize) -> Option<ItemType> {
        (self.type_for_index)(index)
    }

    fn estimate_for(&self, item_type: ItemType, index: usize) -> Dimension {
        (self.estimate)(item_type, index)
    }

    fn should_refresh_with_anchoring(&self) -> bool {
        self.refresh_with_anchoring
    }
}
