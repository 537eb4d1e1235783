//! Sparse slot deltas and the merge-on-read overlay.
//!
//! # Responsibility
//! - Represent uncommitted per-slot edits as field-sparse deltas.
//! - Merge deltas onto the last-fetched remote grid deterministically.
//!
//! # Invariants
//! - `overlay` is pure and idempotent: same inputs, structurally equal
//!   output, and overlaying an empty delta map is the identity.
//! - A delta never touches `source`; provenance belongs to the resolver.

use crate::model::activity::ActivityId;
use crate::model::effective::{EffectiveGrid, EffectiveSlot};
use crate::model::slot::SlotKey;
use crate::model::template::clamp_priority;
use std::collections::BTreeMap;

/// Uncommitted edit for one slot.
///
/// Every field is optional: `None` leaves the remote value untouched. For
/// the doubly-optional fields the inner `None` is an explicit clear, which
/// is distinct from "untouched".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotEdit {
    pub activity: Option<Option<ActivityId>>,
    pub locked: Option<bool>,
    pub priority: Option<u8>,
    pub notes: Option<Option<String>>,
    pub activity_type_override: Option<Option<String>>,
}

impl SlotEdit {
    /// Merges a later delta onto this one, field by field (last write wins).
    pub fn merge_from(&mut self, later: &SlotEdit) {
        if let Some(activity) = later.activity {
            self.activity = Some(activity);
        }
        if let Some(locked) = later.locked {
            self.locked = Some(locked);
        }
        if let Some(priority) = later.priority {
            self.priority = Some(clamp_priority(priority));
        }
        if let Some(notes) = &later.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(override_value) = &later.activity_type_override {
            self.activity_type_override = Some(override_value.clone());
        }
    }
}

/// Shallow-merges one delta onto one remote slot.
pub fn overlay_slot(remote: &EffectiveSlot, edit: &SlotEdit) -> EffectiveSlot {
    let mut merged = remote.clone();
    if let Some(activity) = edit.activity {
        merged.activity = activity;
    }
    if let Some(locked) = edit.locked {
        merged.locked = locked;
    }
    if let Some(priority) = edit.priority {
        merged.priority = clamp_priority(priority);
    }
    if let Some(notes) = &edit.notes {
        merged.notes = notes.clone();
    }
    if let Some(override_value) = &edit.activity_type_override {
        merged.activity_type_override = override_value.clone();
    }
    merged
}

/// Computes the grid the UI renders: remote truth plus uncommitted deltas.
pub fn overlay(remote: &EffectiveGrid, edits: &BTreeMap<SlotKey, SlotEdit>) -> EffectiveGrid {
    let mut merged = remote.clone();
    for (key, edit) in edits {
        merged.set(overlay_slot(remote.get(*key), edit));
    }
    merged
}
