//! Recurring pattern-store rows.
//!
//! # Responsibility
//! - Define the base weekly template slot record and its write shape.
//! - Enforce priority bounds by clamping at the boundary.
//!
//! # Invariants
//! - `(day, time)` identity is immutable once a row exists.
//! - `priority` always lands in 0..=100; out-of-range input is clamped,
//!   never rejected.

use crate::model::activity::ActivityId;
use crate::model::slot::{DayOfWeek, SlotKey, TimeOfDay};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one recurring weekly template.
pub type TemplateId = Uuid;

/// Soft-constraint weight default for slots nobody has tuned.
pub const DEFAULT_PRIORITY: u8 = 50;

/// Upper bound of the soft-constraint weight range.
pub const MAX_PRIORITY: u8 = 100;

/// Clamps a solver priority into the supported 0..=100 range.
pub fn clamp_priority(value: u8) -> u8 {
    value.min(MAX_PRIORITY)
}

/// One row of the recurring pattern store.
///
/// Sparse: a template holds 0..=14 rows, one per populated `(day, time)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSlot {
    pub day: DayOfWeek,
    pub time: TimeOfDay,
    /// `None` means the slot is unassigned in the recurring pattern.
    pub activity: Option<ActivityId>,
    /// Advisory lock: bulk/paint edits must not overwrite without an
    /// explicit unlock. Resolution itself ignores it.
    pub locked: bool,
    /// Soft-constraint weight consumed by the downstream solver, 0..=100.
    pub priority: u8,
    pub notes: Option<String>,
    /// Categorical override of the assigned activity's default
    /// classification.
    pub activity_type_override: Option<String>,
}

impl TemplateSlot {
    /// Creates an unassigned, unlocked row with default priority.
    pub fn empty(day: DayOfWeek, time: TimeOfDay) -> Self {
        Self {
            day,
            time,
            activity: None,
            locked: false,
            priority: DEFAULT_PRIORITY,
            notes: None,
            activity_type_override: None,
        }
    }

    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.day, self.time)
    }
}

/// Write shape for one template slot in a bulk update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSlotRequest {
    pub day: DayOfWeek,
    pub time: TimeOfDay,
    pub activity: Option<ActivityId>,
    pub locked: bool,
    pub priority: u8,
    pub notes: Option<String>,
    pub activity_type_override: Option<String>,
}

impl TemplateSlotRequest {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.day, self.time)
    }
}
