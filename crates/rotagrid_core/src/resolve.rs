//! Pure merge of template and override stores into an effective week.
//!
//! # Responsibility
//! - Compute the effective 14-slot grid for a target date window or week
//!   number.
//! - Apply override precedence: all-weeks, then week-scoped, then
//!   date-scoped.
//!
//! # Invariants
//! - The resolver never mutates a store and never fails on malformed data;
//!   bad rows degrade toward the empty default.
//! - Exactly one effective slot per key, always.
//! - Locks do not protect a slot from an applicable override; they only
//!   constrain editor painting.

use crate::model::effective::{EffectiveGrid, SlotSource};
use crate::model::overrides::{OverrideScope, OverrideSlot};
use crate::model::slot::WeekNumber;
use crate::model::template::{clamp_priority, TemplateSlot};
use chrono::{Days, NaiveDate};

/// What the grid is being resolved for.
///
/// Both fields may be set (a concrete week that is also week N of the
/// rotation block); both may be absent, which resolves the bare template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveTarget {
    /// First day (Sunday) of the concrete week, when resolving for dates.
    pub week_start: Option<NaiveDate>,
    /// Week slot within the 4-week rotation block, when resolving by week.
    pub week_number: Option<WeekNumber>,
}

impl ResolveTarget {
    pub fn for_week_number(week_number: WeekNumber) -> Self {
        Self {
            week_start: None,
            week_number: Some(week_number),
        }
    }

    pub fn for_week_starting(week_start: NaiveDate) -> Self {
        Self {
            week_start: Some(week_start),
            week_number: None,
        }
    }
}

/// Resolves the effective weekly grid from sparse store snapshots.
///
/// Applicable overrides are layered in ascending precedence: all-weeks,
/// then week-number-specific, then date-specific. Within one precedence
/// class the last override in input order wins; persisted data should not
/// contain such collisions (the repository enforces uniqueness per scope
/// and key on write), but rows predating that rule are tolerated here.
pub fn resolve_effective_week(
    template: &[TemplateSlot],
    overrides: &[OverrideSlot],
    target: &ResolveTarget,
) -> EffectiveGrid {
    let mut grid = EffectiveGrid::empty();

    for row in template {
        let slot = grid.get_mut(row.key());
        slot.activity = row.activity;
        slot.locked = row.locked;
        slot.priority = clamp_priority(row.priority);
        slot.notes = row.notes.clone();
        slot.activity_type_override = row.activity_type_override.clone();
        // An unassigned template row still contributes lock/priority/notes
        // but does not count as a template-sourced assignment.
        slot.source = row.activity.is_some().then_some(SlotSource::Template);
    }

    for precedence in 0u8..=2 {
        for row in overrides {
            if row.scope.precedence() != precedence || !applies(row, target) {
                continue;
            }
            let slot = grid.get_mut(row.key());
            slot.activity = row.activity;
            slot.locked = row.locked;
            slot.source = Some(SlotSource::Override);
        }
    }

    grid
}

/// Whether one override row is in scope for the target.
fn applies(row: &OverrideSlot, target: &ResolveTarget) -> bool {
    match row.scope {
        OverrideScope::AllWeeks => true,
        OverrideScope::Week(week) => target.week_number == Some(week),
        OverrideScope::Date(date) => match target.week_start {
            Some(week_start) => date_in_week(date, week_start),
            None => false,
        },
    }
}

fn date_in_week(date: NaiveDate, week_start: NaiveDate) -> bool {
    match week_start.checked_add_days(Days::new(7)) {
        Some(week_end) => week_start <= date && date < week_end,
        // A week starting at the calendar's end has no following week to
        // exclude; fall back to the lower bound only.
        None => week_start <= date,
    }
}
