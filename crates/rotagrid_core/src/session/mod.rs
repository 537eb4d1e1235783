//! Edit-session state machine for the weekly grid editors.
//!
//! # Responsibility
//! - Hold the transient in-memory editing state: remote truth, uncommitted
//!   deltas, paint/selection cursor and commit lifecycle phase.
//! - Provide a pure `(state, command) -> state` transition, testable
//!   without any rendering framework.
//!
//! # Invariants
//! - `has_unsaved_changes()` is true iff at least one delta is queued.
//! - While `Saving`, every mutating command (including `Cancel`) is a
//!   no-op; only commit-completion commands advance the machine.
//! - Locked slots reject painting and clearing, never lock toggling.
//! - Cancel restores the last-fetched remote grid exactly.

pub mod overlay;

use crate::model::activity::ActivityId;
use crate::model::effective::EffectiveGrid;
use crate::model::overrides::PersonId;
use crate::model::slot::{SlotKey, WeekNumber};
use crate::model::template::{clamp_priority, TemplateId};
use overlay::{overlay, overlay_slot, SlotEdit};
use std::collections::BTreeMap;

/// Which store a committed session ultimately writes.
///
/// The resolver and the reducer are identical in both modes; only the
/// commit translation differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    /// Edits become template bulk updates.
    Template(TemplateId),
    /// Edits become override creations/deletions for this person.
    Week(PersonId),
}

/// Commit lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Clean,
    Dirty,
    Saving,
}

/// One editor interaction, applied through [`EditSession::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Arms (or disarms, with `None`) the activity painted by slot clicks.
    SelectPaintActivity(Option<ActivityId>),
    /// Paints the armed activity if the slot is unlocked, and toggles the
    /// detail-panel selection.
    ClickSlot(SlotKey),
    /// Flips the merged lock flag; always permitted.
    ToggleLock(SlotKey),
    /// Explicitly clears the slot's assignment (honors locks like a paint).
    ClearSlot(SlotKey),
    /// Sets the solver priority, clamped into 0..=100.
    SetPriority(SlotKey, u8),
    SetNotes(SlotKey, Option<String>),
    SetActivityTypeOverride(SlotKey, Option<String>),
    SelectWeek(Option<WeekNumber>),
    /// Flips the same-pattern flag; when set, the selected week collapses
    /// to "all weeks". Affects commit translation only.
    ToggleSamePatternAllWeeks,
    /// Dirty -> Saving. No-op unless Dirty.
    BeginCommit,
    /// Saving -> Clean with the refetched grid as the new remote truth.
    CommitSucceeded(EffectiveGrid),
    /// Saving -> Dirty; queued deltas are retained verbatim for retry.
    CommitFailed,
    /// Replaces remote truth after an explicit reload, discarding deltas.
    ReplaceRemote(EffectiveGrid),
    /// Discards all deltas and returns to Clean.
    Cancel,
}

/// Transient, per-editor-instance state. Created when an editor opens and
/// never persisted across reloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    mode: EditorMode,
    remote: EffectiveGrid,
    edits: BTreeMap<SlotKey, SlotEdit>,
    selection: Option<SlotKey>,
    paint_activity: Option<ActivityId>,
    selected_week: Option<WeekNumber>,
    same_pattern_all_weeks: bool,
    phase: SessionPhase,
}

impl EditSession {
    /// Opens a session over the last-fetched remote grid.
    pub fn new(mode: EditorMode, remote: EffectiveGrid, selected_week: Option<WeekNumber>) -> Self {
        Self {
            mode,
            remote,
            edits: BTreeMap::new(),
            selection: None,
            paint_activity: None,
            selected_week,
            same_pattern_all_weeks: false,
            phase: SessionPhase::Clean,
        }
    }

    /// Pure state transition. Consumes the session and returns the next
    /// state; unknown-at-this-phase commands return the state unchanged.
    pub fn apply(mut self, command: EditCommand) -> Self {
        if self.phase == SessionPhase::Saving {
            return match command {
                EditCommand::CommitSucceeded(grid) => {
                    self.remote = grid;
                    self.edits.clear();
                    self.phase = SessionPhase::Clean;
                    self
                }
                EditCommand::CommitFailed => {
                    self.phase = SessionPhase::Dirty;
                    self
                }
                // Cooperative lock: one writer, no mutations racing a
                // commit in flight. Cancel included.
                _ => self,
            };
        }

        match command {
            EditCommand::SelectPaintActivity(activity) => {
                self.paint_activity = activity;
            }
            EditCommand::ClickSlot(key) => {
                if let Some(activity) = self.paint_activity {
                    if !self.merged_slot_locked(key) {
                        self.stage(key, SlotEdit {
                            activity: Some(Some(activity)),
                            ..SlotEdit::default()
                        });
                    }
                }
                self.selection = if self.selection == Some(key) {
                    None
                } else {
                    Some(key)
                };
            }
            EditCommand::ToggleLock(key) => {
                let locked = self.merged_slot_locked(key);
                self.stage(key, SlotEdit {
                    locked: Some(!locked),
                    ..SlotEdit::default()
                });
            }
            EditCommand::ClearSlot(key) => {
                if !self.merged_slot_locked(key) {
                    self.stage(key, SlotEdit {
                        activity: Some(None),
                        ..SlotEdit::default()
                    });
                }
            }
            EditCommand::SetPriority(key, value) => {
                self.stage(key, SlotEdit {
                    priority: Some(clamp_priority(value)),
                    ..SlotEdit::default()
                });
            }
            EditCommand::SetNotes(key, notes) => {
                self.stage(key, SlotEdit {
                    notes: Some(notes),
                    ..SlotEdit::default()
                });
            }
            EditCommand::SetActivityTypeOverride(key, value) => {
                self.stage(key, SlotEdit {
                    activity_type_override: Some(value),
                    ..SlotEdit::default()
                });
            }
            EditCommand::SelectWeek(week) => {
                // Per-week tabs are disabled while the same-pattern flag is
                // set; the command is ignored rather than an error.
                if !self.same_pattern_all_weeks {
                    self.selected_week = week;
                }
            }
            EditCommand::ToggleSamePatternAllWeeks => {
                self.same_pattern_all_weeks = !self.same_pattern_all_weeks;
                if self.same_pattern_all_weeks {
                    self.selected_week = None;
                }
            }
            EditCommand::BeginCommit => {
                if self.phase == SessionPhase::Dirty {
                    self.phase = SessionPhase::Saving;
                }
            }
            EditCommand::CommitSucceeded(_) | EditCommand::CommitFailed => {
                // Only meaningful while Saving.
            }
            EditCommand::ReplaceRemote(grid) => {
                self.remote = grid;
                self.edits.clear();
                self.phase = SessionPhase::Clean;
            }
            EditCommand::Cancel => {
                self.edits.clear();
                self.phase = SessionPhase::Clean;
            }
        }

        self
    }

    /// The grid the UI renders right now: remote truth plus queued deltas.
    pub fn displayed_grid(&self) -> EffectiveGrid {
        overlay(&self.remote, &self.edits)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn selection(&self) -> Option<SlotKey> {
        self.selection
    }

    pub fn paint_activity(&self) -> Option<ActivityId> {
        self.paint_activity
    }

    pub fn selected_week(&self) -> Option<WeekNumber> {
        self.selected_week
    }

    pub fn same_pattern_all_weeks(&self) -> bool {
        self.same_pattern_all_weeks
    }

    /// Last-fetched server truth, untouched by local deltas.
    pub fn remote_grid(&self) -> &EffectiveGrid {
        &self.remote
    }

    /// Queued deltas, keyed by slot in storage order.
    pub fn edits(&self) -> &BTreeMap<SlotKey, SlotEdit> {
        &self.edits
    }

    fn merged_slot_locked(&self, key: SlotKey) -> bool {
        match self.edits.get(&key) {
            Some(edit) => overlay_slot(self.remote.get(key), edit).locked,
            None => self.remote.get(key).locked,
        }
    }

    fn stage(&mut self, key: SlotKey, delta: SlotEdit) {
        self.edits.entry(key).or_default().merge_from(&delta);
        self.phase = SessionPhase::Dirty;
    }
}
