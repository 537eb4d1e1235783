//! Resolved effective slots and the fixed 14-entry weekly grid.
//!
//! # Responsibility
//! - Define the read-only resolved slot shape with provenance.
//! - Hold exactly one entry per `SlotKey` by construction.
//!
//! # Invariants
//! - `EffectiveGrid` always contains exactly 14 entries, one per key; the
//!   invariant comes from the fixed array, not from runtime checks.
//! - `source` is `Some(Override)` iff an applicable override produced the
//!   slot, `Some(Template)` iff an assigned template row did, else `None`.

use crate::model::activity::ActivityId;
use crate::model::slot::{SlotKey, ALL_SLOT_KEYS, DISPLAY_ORDER, SLOT_COUNT};
use crate::model::template::DEFAULT_PRIORITY;
use serde::{Deserialize, Serialize};

/// Provenance of a resolved slot value, for UI badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    Template,
    Override,
}

/// The resolved assignment for one grid cell. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveSlot {
    pub key: SlotKey,
    pub activity: Option<ActivityId>,
    pub locked: bool,
    pub priority: u8,
    pub notes: Option<String>,
    pub activity_type_override: Option<String>,
    /// `None` when neither store contributed an assignment.
    pub source: Option<SlotSource>,
}

impl EffectiveSlot {
    /// The default a missing store row resolves to.
    pub fn empty(key: SlotKey) -> Self {
        Self {
            key,
            activity: None,
            locked: false,
            priority: DEFAULT_PRIORITY,
            notes: None,
            activity_type_override: None,
            source: None,
        }
    }

    /// Whether anything distinguishes this slot from the empty default.
    pub fn is_empty_default(&self) -> bool {
        self == &Self::empty(self.key)
    }
}

/// Resolved weekly grid: exactly one `EffectiveSlot` per `SlotKey`.
///
/// Serializable for UI consumption but deliberately not deserializable:
/// grids are only ever produced by the resolver or the overlay, which is
/// what guarantees the one-entry-per-key invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveGrid {
    slots: Vec<EffectiveSlot>,
}

impl EffectiveGrid {
    /// A grid of 14 empty defaults.
    pub fn empty() -> Self {
        Self {
            slots: ALL_SLOT_KEYS.iter().map(|key| EffectiveSlot::empty(*key)).collect(),
        }
    }

    pub fn get(&self, key: SlotKey) -> &EffectiveSlot {
        &self.slots[key.index()]
    }

    pub fn get_mut(&mut self, key: SlotKey) -> &mut EffectiveSlot {
        &mut self.slots[key.index()]
    }

    /// Replaces the entry at the slot's own key.
    pub fn set(&mut self, slot: EffectiveSlot) {
        let index = slot.key.index();
        self.slots[index] = slot;
    }

    /// Iterates in canonical storage order (Sun AM .. Sat PM).
    pub fn iter(&self) -> impl Iterator<Item = &EffectiveSlot> {
        self.slots.iter()
    }

    /// Iterates in rendering order (Mon AM .. Sun PM). Rendering only;
    /// persistence must use storage order.
    pub fn iter_display(&self) -> impl Iterator<Item = &EffectiveSlot> {
        DISPLAY_ORDER.iter().flat_map(move |day| {
            self.slots
                .iter()
                .filter(move |slot| slot.key.day == *day)
        })
    }

    pub fn len(&self) -> usize {
        SLOT_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for EffectiveGrid {
    fn default() -> Self {
        Self::empty()
    }
}
