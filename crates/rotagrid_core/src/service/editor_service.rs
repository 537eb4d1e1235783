//! Editor use-case service: open, commit and reload grid edit sessions.
//!
//! # Responsibility
//! - Assemble editor state from the persistence stores and the resolver.
//! - Translate committed sessions into batched persistence calls. The
//!   template/week mode duality lives here and only here; the resolver and
//!   the reducer are mode-agnostic.
//!
//! # Invariants
//! - A failed commit never discards queued deltas; the session returns to
//!   `Dirty` with edits intact for retry.
//! - No partial apply: any repository error fails the whole commit.
//! - `reload` discards local edits by design and is only reachable as an
//!   explicit caller action.

use crate::model::activity::{Activity, Role};
use crate::model::effective::EffectiveGrid;
use crate::model::overrides::{
    OverrideId, OverrideRequest, OverrideScope, OverrideSlot, PersonId,
};
use crate::model::slot::{SlotKey, WeekNumber};
use crate::model::template::{TemplateId, TemplateSlotRequest};
use crate::repo::schedule_repo::{RepoError, ScheduleRepository};
use crate::resolve::{resolve_effective_week, ResolveTarget};
use crate::session::{EditCommand, EditSession, EditorMode, SessionPhase};
use chrono::NaiveDate;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from editor service operations.
#[derive(Debug)]
pub enum EditorError {
    /// Initial or refresh fetch failed; no partial grid is produced.
    Fetch(RepoError),
    /// Commit write failed; the session keeps its edits for retry.
    Commit(RepoError),
    /// A commit is already in flight.
    SavingInProgress,
    /// A queued delta is not committable; the offending slot is named so
    /// the UI can highlight it.
    InvalidEdit { key: SlotKey },
    /// A queued delta touches fields the target store cannot hold, so a
    /// commit would silently revert it on refetch.
    UnsupportedEdit { key: SlotKey },
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "fetch failed: {err}"),
            Self::Commit(err) => write!(f, "commit failed: {err}"),
            Self::SavingInProgress => write!(f, "a commit is already in flight"),
            Self::InvalidEdit { key } => {
                write!(f, "slot {key} is locked but left without an assignment")
            }
            Self::UnsupportedEdit { key } => {
                write!(
                    f,
                    "slot {key} has detail edits that cannot be stored as an override"
                )
            }
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(err) | Self::Commit(err) => Some(err),
            Self::SavingInProgress | Self::InvalidEdit { .. } | Self::UnsupportedEdit { .. } => {
                None
            }
        }
    }
}

/// Everything one open editor instance needs, bundled.
#[derive(Debug, Clone)]
pub struct EditorState {
    pub session: EditSession,
    /// Role-filtered assignable palette.
    pub palette: Vec<Activity>,
    /// Last-fetched override rows (week mode; empty in template mode).
    pub overrides: Vec<OverrideSlot>,
    pub template_id: TemplateId,
    pub week_start: Option<NaiveDate>,
}

impl EditorState {
    fn resolve_target(&self) -> ResolveTarget {
        ResolveTarget {
            week_start: self.week_start,
            week_number: self.session.selected_week(),
        }
    }
}

/// The batched persistence calls one commit translates into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitPlan {
    TemplateUpdate {
        template: TemplateId,
        slots: Vec<TemplateSlotRequest>,
        clear_existing: bool,
    },
    OverrideWrites {
        person: PersonId,
        deletes: Vec<OverrideId>,
        creates: Vec<OverrideRequest>,
    },
}

/// Translates a session's queued deltas into a persistence plan.
///
/// Pure; returns `Ok(None)` when there is nothing to commit. Template mode
/// rewrites the full populated grid with `clear_existing`; week mode turns
/// each edited slot into an override create (replacing any existing
/// override for the same scope and slot via an explicit delete). Override
/// rows hold assignment and lock only, so week mode refuses deltas that
/// touch priority, notes or activity-type: accepting them would hand back
/// `Ok` and then revert the edit on refetch.
pub fn build_commit_plan(
    session: &EditSession,
    existing_overrides: &[OverrideSlot],
) -> Result<Option<CommitPlan>, EditorError> {
    if !session.has_unsaved_changes() {
        return Ok(None);
    }

    let displayed = session.displayed_grid();

    // A protected slot with nothing to protect is a validation failure the
    // UI must resolve before committing.
    for key in session.edits().keys() {
        let merged = displayed.get(*key);
        if merged.locked && merged.activity.is_none() {
            return Err(EditorError::InvalidEdit { key: *key });
        }
    }

    let plan = match session.mode() {
        EditorMode::Template(template) => {
            let slots = displayed
                .iter()
                .filter(|slot| {
                    slot.activity.is_some()
                        || slot.locked
                        || slot.priority != crate::model::template::DEFAULT_PRIORITY
                        || slot.notes.is_some()
                        || slot.activity_type_override.is_some()
                })
                .map(|slot| TemplateSlotRequest {
                    day: slot.key.day,
                    time: slot.key.time,
                    activity: slot.activity,
                    locked: slot.locked,
                    priority: slot.priority,
                    notes: slot.notes.clone(),
                    activity_type_override: slot.activity_type_override.clone(),
                })
                .collect();
            CommitPlan::TemplateUpdate {
                template,
                slots,
                clear_existing: true,
            }
        }
        EditorMode::Week(person) => {
            let scope = if session.same_pattern_all_weeks() {
                OverrideScope::AllWeeks
            } else {
                session
                    .selected_week()
                    .map(OverrideScope::Week)
                    .unwrap_or(OverrideScope::AllWeeks)
            };

            let mut deletes = Vec::new();
            let mut creates = Vec::new();
            for (key, edit) in session.edits() {
                if edit.priority.is_some()
                    || edit.notes.is_some()
                    || edit.activity_type_override.is_some()
                {
                    return Err(EditorError::UnsupportedEdit { key: *key });
                }

                deletes.extend(
                    existing_overrides
                        .iter()
                        .filter(|row| row.scope == scope && row.key() == *key)
                        .map(|row| row.id),
                );

                let merged = displayed.get(*key);
                creates.push(OverrideRequest {
                    scope,
                    day: key.day,
                    time: key.time,
                    activity: merged.activity,
                    locked: merged.locked,
                    // Audit reasons come from dedicated override tooling,
                    // not from grid edits.
                    reason: None,
                });
            }
            CommitPlan::OverrideWrites {
                person,
                deletes,
                creates,
            }
        }
    };

    Ok(Some(plan))
}

/// Editor orchestration over any schedule repository.
pub struct EditorService<R: ScheduleRepository> {
    repo: R,
}

impl<R: ScheduleRepository> EditorService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Opens a template-mode editor: the recurring pattern is both source
    /// and destination.
    pub fn open_template_editor(
        &self,
        template: TemplateId,
        role: Role,
    ) -> Result<EditorState, EditorError> {
        let slots = self.repo.fetch_template(template).map_err(EditorError::Fetch)?;
        let palette = self
            .repo
            .fetch_permitted_activities(role)
            .map_err(EditorError::Fetch)?;

        let grid = resolve_effective_week(&slots, &[], &ResolveTarget::default());
        let session = EditSession::new(EditorMode::Template(template), grid, None);

        info!("event=editor_open module=service status=ok mode=template template={template}");
        Ok(EditorState {
            session,
            palette,
            overrides: Vec::new(),
            template_id: template,
            week_start: None,
        })
    }

    /// Opens a week-mode editor: edits become overrides scoped to the
    /// selected week (or all weeks), layered over the base template.
    pub fn open_week_editor(
        &self,
        template: TemplateId,
        person: PersonId,
        role: Role,
        week_start: NaiveDate,
        week_number: Option<WeekNumber>,
    ) -> Result<EditorState, EditorError> {
        let slots = self.repo.fetch_template(template).map_err(EditorError::Fetch)?;
        let overrides = self.repo.fetch_overrides(person).map_err(EditorError::Fetch)?;
        let palette = self
            .repo
            .fetch_permitted_activities(role)
            .map_err(EditorError::Fetch)?;

        let target = ResolveTarget {
            week_start: Some(week_start),
            week_number,
        };
        let grid = resolve_effective_week(&slots, &overrides, &target);
        let session = EditSession::new(EditorMode::Week(person), grid, week_number);

        info!("event=editor_open module=service status=ok mode=week person={person}");
        Ok(EditorState {
            session,
            palette,
            overrides,
            template_id: template,
            week_start: Some(week_start),
        })
    }

    /// Commits queued deltas in one batch per store.
    ///
    /// On success the session transitions to `Clean` over the refetched
    /// grid. On failure it returns to `Dirty` with edits intact; retrying
    /// is safe because both write paths replace rather than append.
    pub fn commit(&self, state: &mut EditorState) -> Result<(), EditorError> {
        if state.session.phase() == SessionPhase::Saving {
            return Err(EditorError::SavingInProgress);
        }

        let Some(plan) = build_commit_plan(&state.session, &state.overrides)? else {
            return Ok(());
        };

        state.session = state.session.clone().apply(EditCommand::BeginCommit);
        info!("event=commit module=service status=start");

        if let Err(err) = self.execute_plan(&plan) {
            state.session = state.session.clone().apply(EditCommand::CommitFailed);
            error!("event=commit module=service status=error error={err}");
            return Err(EditorError::Commit(err));
        }

        match self.refetch(state) {
            Ok(grid) => {
                state.session = state
                    .session
                    .clone()
                    .apply(EditCommand::CommitSucceeded(grid));
                info!("event=commit module=service status=ok");
                Ok(())
            }
            Err(err) => {
                // Writes landed but the refresh failed; keep edits so a
                // retry (a no-op rewrite) re-runs the fetch.
                state.session = state.session.clone().apply(EditCommand::CommitFailed);
                error!("event=commit module=service status=error stage=refetch error={err}");
                Err(EditorError::Fetch(err))
            }
        }
    }

    /// Discards local edits and replaces the remote grid with fresh store
    /// state. Explicit caller action only.
    pub fn reload(&self, state: &mut EditorState) -> Result<(), EditorError> {
        if state.session.phase() == SessionPhase::Saving {
            return Err(EditorError::SavingInProgress);
        }

        let grid = self.refetch(state).map_err(EditorError::Fetch)?;
        state.session = state.session.clone().apply(EditCommand::ReplaceRemote(grid));
        info!("event=editor_reload module=service status=ok");
        Ok(())
    }

    fn execute_plan(&self, plan: &CommitPlan) -> Result<(), RepoError> {
        match plan {
            CommitPlan::TemplateUpdate {
                template,
                slots,
                clear_existing,
            } => self
                .repo
                .update_template_slots(*template, slots, *clear_existing),
            CommitPlan::OverrideWrites {
                person,
                deletes,
                creates,
            } => {
                for id in deletes {
                    self.repo.delete_override(*id)?;
                }
                for request in creates {
                    self.repo.create_override(*person, request)?;
                }
                Ok(())
            }
        }
    }

    fn refetch(&self, state: &mut EditorState) -> Result<EffectiveGrid, RepoError> {
        let slots = self.repo.fetch_template(state.template_id)?;
        let overrides = match state.session.mode() {
            EditorMode::Template(_) => Vec::new(),
            EditorMode::Week(person) => self.repo.fetch_overrides(person)?,
        };

        let grid = resolve_effective_week(&slots, &overrides, &state.resolve_target());
        state.overrides = overrides;
        Ok(grid)
    }
}
