//! Override-store rows layered over the recurring template.
//!
//! # Responsibility
//! - Define date- and week-scoped exception records and their write shape.
//! - Order override scopes by resolution precedence.
//!
//! # Invariants
//! - Overrides are sparse: absence for a `(scope, day, time)` tuple defers
//!   to the template.
//! - `activity: None` on an existing override means "explicitly cleared",
//!   which is distinct from no override at all.

use crate::model::activity::ActivityId;
use crate::model::slot::{DayOfWeek, SlotKey, TimeOfDay, WeekNumber};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for the person (or template) the override targets.
pub type PersonId = Uuid;

/// Stable identifier for one persisted override row.
pub type OverrideId = Uuid;

/// Applicability scope of one override, ordered by precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum OverrideScope {
    /// Applies to every week; the lowest-precedence override scope.
    AllWeeks,
    /// Applies to one week slot of the 4-week rotation block.
    Week(WeekNumber),
    /// Applies to one concrete calendar date; the highest precedence.
    Date(NaiveDate),
}

impl OverrideScope {
    /// Precedence class rank: higher ranks are applied later and win.
    pub fn precedence(self) -> u8 {
        match self {
            Self::AllWeeks => 0,
            Self::Week(_) => 1,
            Self::Date(_) => 2,
        }
    }
}

/// One row of the override store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSlot {
    pub id: OverrideId,
    pub person: PersonId,
    pub scope: OverrideScope,
    pub day: DayOfWeek,
    pub time: TimeOfDay,
    /// `Some` assigns; `None` explicitly clears the template assignment.
    pub activity: Option<ActivityId>,
    pub locked: bool,
    pub reason: Option<String>,
}

impl OverrideSlot {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.day, self.time)
    }
}

/// Write shape for creating one override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub scope: OverrideScope,
    pub day: DayOfWeek,
    pub time: TimeOfDay,
    pub activity: Option<ActivityId>,
    pub locked: bool,
    pub reason: Option<String>,
}

impl OverrideRequest {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.day, self.time)
    }
}
