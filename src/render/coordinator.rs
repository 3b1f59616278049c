//! Render stack maintenance.
//!
//! The render stack maps slot keys to the data index each slot currently
//! shows. Slots are identified by the stable id of the item they were
//! created for, so an item keeps its slot while it stays engaged. When an
//! index leaves the engaged window its slot goes to the recycle pool and the
//! next engaged index of the same item type takes it over.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use super::recycle_pool::{RecyclePool, SlotKey};
use crate::model::{DataProvider, ItemType, LayoutTypeProvider, RecyclerError};
use crate::viewability::IndexDiff;

/// What a slot currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderSlot {
    /// Data index shown, `None` while the slot is parked in the pool.
    pub data_index: Option<usize>,
    /// Item type the slot was built for.
    pub item_type: ItemType,
}

/// One entry of the render stack handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderStackEntry {
    /// Slot identity.
    pub slot_key: SlotKey,
    /// Data index shown by the slot.
    pub data_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SlotAssignment {
    key: SlotKey,
    item_type: ItemType,
}

/// Assigns engaged indexes to recyclable slots.
#[derive(Debug, Clone, Default)]
pub struct RenderWindowCoordinator {
    render_stack: BTreeMap<SlotKey, RenderSlot>,
    index_to_key: HashMap<usize, SlotKey>,
    stable_id_to_slot: HashMap<String, SlotAssignment>,
    pool: RecyclePool,
    engaged: BTreeSet<usize>,
    collision_counter: u64,
    recycling_enabled: bool,
    optimize_for_animations: bool,
    dirty: bool,
}

impl RenderWindowCoordinator {
    /// Create an empty coordinator.
    pub fn new(recycling_enabled: bool) -> Self {
        Self {
            recycling_enabled,
            ..Self::default()
        }
    }

    /// Keep slot identity stable across data changes instead of reusing
    /// freed slots (animations are tied to slots).
    pub fn set_optimize_for_animations(&mut self, value: bool) {
        self.optimize_for_animations = value;
    }

    /// True when freed slots are dropped rather than recycled on data change.
    pub fn optimize_for_animations(&self) -> bool {
        self.optimize_for_animations
    }

    /// Current render stack, in key order.
    pub fn render_stack(&self) -> &BTreeMap<SlotKey, RenderSlot> {
        &self.render_stack
    }

    /// Render stack as a flat list for the host.
    pub fn entries(&self) -> Vec<RenderStackEntry> {
        self.render_stack
            .iter()
            .map(|(key, slot)| RenderStackEntry {
                slot_key: key.clone(),
                data_index: slot.data_index,
            })
            .collect()
    }

    /// Slot currently assigned to `index`.
    pub fn key_for_index(&self, index: usize) -> Option<&SlotKey> {
        self.index_to_key.get(&index)
    }

    /// Data indexes shown by mounted slots.
    pub fn mounted_indexes(&self) -> Vec<usize> {
        self.render_stack.values().filter_map(|slot| slot.data_index).collect()
    }

    /// Number of slots waiting in the recycle pool.
    pub fn pooled_slots(&self) -> usize {
        self.pool.len()
    }

    /// Returns true once after the stack changed.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drop every slot.
    pub fn clear(&mut self) {
        self.render_stack.clear();
        self.index_to_key.clear();
        self.stable_id_to_slot.clear();
        self.pool.clear();
        self.engaged.clear();
        self.dirty = true;
    }

    /// Apply a change of the engaged set: release slots of indexes that left,
    /// assign slots to indexes that entered. Returns whether the stack changed.
    ///
    /// # Errors
    ///
    /// [`RecyclerError::InvalidItemType`] when an entering index has no type.
    pub fn on_engaged_changed<D: DataProvider + ?Sized>(
        &mut self,
        diff: &IndexDiff,
        data: &D,
        types: &dyn LayoutTypeProvider,
    ) -> Result<bool, RecyclerError> {
        let item_count = data.size();
        for &index in &diff.not_now {
            self.engaged.remove(&index);
            if index >= item_count {
                if let Some(key) = self.index_to_key.get(&index).cloned() {
                    self.release_slot(&key);
                }
                continue;
            }
            let stable_id = data.stable_id(index);
            if self.recycling_enabled {
                if let Some(assigned) = self.stable_id_to_slot.get(&stable_id) {
                    self.pool.put(assigned.item_type, assigned.key.clone());
                }
            } else if let Some(assigned) = self.stable_id_to_slot.remove(&stable_id) {
                self.render_stack.remove(&assigned.key);
                self.index_to_key.remove(&index);
                self.dirty = true;
            }
        }
        for &index in &diff.now {
            self.engaged.insert(index);
            if index < item_count {
                self.sync_and_get_key(index, data, types)?;
            }
        }
        Ok(self.dirty)
    }

    /// Release every slot showing an index at or past `size`. Returns
    /// whether any slot was released.
    ///
    /// Needed on every data change: without stable ids the render stack is
    /// not re-keyed, so slots of removed indexes would stay bound.
    pub fn release_out_of_range(&mut self, size: usize) -> bool {
        let stale: Vec<SlotKey> = self
            .render_stack
            .iter()
            .filter(|(_, slot)| slot.data_index.is_some_and(|index| index >= size))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            self.release_slot(key);
        }
        self.engaged.retain(|&index| index < size);
        if !stale.is_empty() {
            debug!(size, released = stale.len(), "released slots past the end of the data");
        }
        !stale.is_empty()
    }

    /// Unbind `key` from its index. Parked in the pool when recycling,
    /// unmounted otherwise.
    fn release_slot(&mut self, key: &SlotKey) {
        let Some(slot) = self.render_stack.get_mut(key) else {
            return;
        };
        if let Some(index) = slot.data_index.take() {
            if self.index_to_key.get(&index) == Some(key) {
                self.index_to_key.remove(&index);
            }
        }
        let item_type = slot.item_type;
        self.stable_id_to_slot.retain(|_, assigned| &assigned.key != key);
        if self.recycling_enabled {
            self.pool.put(item_type, key.clone());
        } else {
            self.render_stack.remove(key);
        }
        self.dirty = true;
    }

    /// Slot for `index`, assigning one when the item has none.
    ///
    /// Reuse order: the slot already bound to the item's stable id, then a
    /// pooled slot of the same type, then a new slot keyed by the stable id.
    ///
    /// # Errors
    ///
    /// [`RecyclerError::InvalidItemType`] when `index` has no type.
    pub fn sync_and_get_key<D: DataProvider + ?Sized>(
        &mut self,
        index: usize,
        data: &D,
        types: &dyn LayoutTypeProvider,
    ) -> Result<SlotKey, RecyclerError> {
        let stable_id = data.stable_id(index);
        let key = match self.stable_id_to_slot.get(&stable_id) {
            Some(assigned) => assigned.key.clone(),
            None => self.assign_slot(index, stable_id, types)?,
        };

        if self.engaged.contains(&index) {
            self.pool.remove(&key);
        }
        if self
            .render_stack
            .get(&key)
            .is_some_and(|slot| slot.data_index != Some(index))
        {
            warn!(index, key = %key, "possible stable id collision");
        }
        Ok(key)
    }

    fn assign_slot(
        &mut self,
        index: usize,
        stable_id: String,
        types: &dyn LayoutTypeProvider,
    ) -> Result<SlotKey, RecyclerError> {
        let item_type = types
            .type_for_index(index)
            .ok_or(RecyclerError::InvalidItemType { index })?;

        let key = match self.pool.take(item_type) {
            Some(key) => {
                let previous = self.render_stack.insert(
                    key.clone(),
                    RenderSlot {
                        data_index: Some(index),
                        item_type,
                    },
                );
                if let Some(old) = previous.and_then(|slot| slot.data_index) {
                    if old != index && self.index_to_key.get(&old) == Some(&key) {
                        self.index_to_key.remove(&old);
                    }
                }
                self.stable_id_to_slot.retain(|_, assigned| assigned.key != key);
                key
            }
            None => {
                let mut key = SlotKey::new(stable_id.clone());
                if self.render_stack.contains_key(&key) {
                    key = self.collision_avoiding_key();
                }
                self.render_stack.insert(
                    key.clone(),
                    RenderSlot {
                        data_index: Some(index),
                        item_type,
                    },
                );
                key
            }
        };

        self.dirty = true;
        self.index_to_key.insert(index, key.clone());
        self.stable_id_to_slot.insert(
            stable_id,
            SlotAssignment {
                key: key.clone(),
                item_type,
            },
        );
        Ok(key)
    }

    fn collision_avoiding_key(&mut self) -> SlotKey {
        loop {
            let key = SlotKey::new(format!("#{}_slot", self.collision_counter));
            self.collision_counter += 1;
            if !self.render_stack.contains_key(&key) {
                return key;
            }
        }
    }

    /// Re-key the render stack after the data provider changed.
    ///
    /// Slots whose item (by stable id) is still shown at a mounted index keep
    /// their key. Freed slots are recycled for the remaining mounted indexes,
    /// or dropped when optimizing for animations.
    ///
    /// # Errors
    ///
    /// [`RecyclerError::InvalidItemType`] when a re-keyed index has no type.
    pub fn handle_data_set_change<D: DataProvider + ?Sized>(
        &mut self,
        data: &D,
        types: &dyn LayoutTypeProvider,
    ) -> Result<(), RecyclerError> {
        let size = data.size();
        let old_stack = std::mem::take(&mut self.render_stack);
        let old_slots = std::mem::take(&mut self.stable_id_to_slot);
        self.index_to_key.clear();
        self.pool.clear();
        self.engaged.retain(|&index| index < size);

        let mut claimed: HashSet<SlotKey> = HashSet::new();
        let mut unclaimed_indexes = Vec::new();
        for slot in old_stack.values() {
            let Some(index) = slot.data_index.filter(|&index| index < size) else {
                continue;
            };
            let stable_id = data.stable_id(index);
            let reusable = old_slots.get(&stable_id).filter(|assigned| {
                !claimed.contains(&assigned.key)
                    && old_stack.contains_key(&assigned.key)
                    && types.type_for_index(index) == Some(assigned.item_type)
            });
            match reusable {
                Some(assigned) => {
                    claimed.insert(assigned.key.clone());
                    self.render_stack.insert(
                        assigned.key.clone(),
                        RenderSlot {
                            data_index: Some(index),
                            item_type: assigned.item_type,
                        },
                    );
                    self.index_to_key.insert(index, assigned.key.clone());
                    self.stable_id_to_slot.insert(stable_id, assigned.clone());
                }
                None => unclaimed_indexes.push(index),
            }
        }

        for (key, slot) in &old_stack {
            if claimed.contains(key) || self.optimize_for_animations {
                continue;
            }
            self.render_stack.insert(
                key.clone(),
                RenderSlot {
                    data_index: None,
                    item_type: slot.item_type,
                },
            );
            self.pool.put(slot.item_type, key.clone());
        }

        unclaimed_indexes.sort_unstable();
        unclaimed_indexes.dedup();
        for index in unclaimed_indexes {
            self.sync_and_get_key(index, data, types)?;
        }

        debug!(
            slots = self.render_stack.len(),
            kept = claimed.len(),
            pooled = self.pool.len(),
            "render stack re-keyed"
        );
        self.dirty = true;
        Ok(())
    }
}
