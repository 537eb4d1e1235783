use rotagrid_core::{
    overlay, resolve_effective_week, DayOfWeek, EditCommand, EditSession, EditorMode,
    EffectiveGrid, ResolveTarget, SessionPhase, SlotKey, TemplateSlot, TimeOfDay, WeekNumber,
};
use std::collections::BTreeMap;
use uuid::Uuid;

fn template_session() -> EditSession {
    EditSession::new(
        EditorMode::Template(Uuid::new_v4()),
        EffectiveGrid::empty(),
        None,
    )
}

fn session_with_locked_slot(day: DayOfWeek, time: TimeOfDay, activity: Uuid) -> EditSession {
    let row = TemplateSlot {
        activity: Some(activity),
        locked: true,
        ..TemplateSlot::empty(day, time)
    };
    let grid = resolve_effective_week(&[row], &[], &ResolveTarget::default());
    EditSession::new(EditorMode::Template(Uuid::new_v4()), grid, None)
}

#[test]
fn painting_marks_dirty_and_selects_the_slot() {
    let clinic = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am);

    let session = template_session()
        .apply(EditCommand::SelectPaintActivity(Some(clinic)))
        .apply(EditCommand::ClickSlot(key));

    assert_eq!(session.phase(), SessionPhase::Dirty);
    assert!(session.has_unsaved_changes());
    assert_eq!(session.selection(), Some(key));
    assert_eq!(session.displayed_grid().get(key).activity, Some(clinic));
}

#[test]
fn reclicking_selected_slot_clears_selection_but_keeps_the_edit() {
    let clinic = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am);

    let session = template_session()
        .apply(EditCommand::SelectPaintActivity(Some(clinic)))
        .apply(EditCommand::ClickSlot(key))
        .apply(EditCommand::ClickSlot(key));

    assert_eq!(session.selection(), None);
    assert_eq!(session.displayed_grid().get(key).activity, Some(clinic));
    assert!(session.has_unsaved_changes());
}

#[test]
fn locked_slot_rejects_painting_until_explicitly_unlocked() {
    let original = Uuid::new_v4();
    let replacement = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Wednesday, TimeOfDay::Am);

    let session = session_with_locked_slot(DayOfWeek::Wednesday, TimeOfDay::Am, original)
        .apply(EditCommand::SelectPaintActivity(Some(replacement)))
        .apply(EditCommand::ClickSlot(key));

    // Rejected: the slot keeps its assignment.
    assert_eq!(session.displayed_grid().get(key).activity, Some(original));

    let session = session
        .apply(EditCommand::ToggleLock(key))
        .apply(EditCommand::ClickSlot(key));
    assert_eq!(session.displayed_grid().get(key).activity, Some(replacement));
    assert!(!session.displayed_grid().get(key).locked);
}

#[test]
fn locked_slot_rejects_clearing_but_allows_lock_toggle() {
    let original = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Thursday, TimeOfDay::Pm);

    let session = session_with_locked_slot(DayOfWeek::Thursday, TimeOfDay::Pm, original)
        .apply(EditCommand::ClearSlot(key));
    assert_eq!(session.displayed_grid().get(key).activity, Some(original));
    assert!(!session.has_unsaved_changes());

    let session = session
        .apply(EditCommand::ToggleLock(key))
        .apply(EditCommand::ClearSlot(key));
    assert_eq!(session.displayed_grid().get(key).activity, None);
}

#[test]
fn priority_is_clamped_at_the_boundary_never_an_error() {
    let key = SlotKey::new(DayOfWeek::Friday, TimeOfDay::Am);
    let session = template_session().apply(EditCommand::SetPriority(key, 210));

    assert_eq!(session.displayed_grid().get(key).priority, 100);
    assert_eq!(session.phase(), SessionPhase::Dirty);
}

#[test]
fn detail_edits_merge_into_one_delta_per_slot() {
    let clinic = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Tuesday, TimeOfDay::Am);

    let session = template_session()
        .apply(EditCommand::SelectPaintActivity(Some(clinic)))
        .apply(EditCommand::ClickSlot(key))
        .apply(EditCommand::SetPriority(key, 70))
        .apply(EditCommand::SetNotes(key, Some("prefers mornings".to_string())));

    assert_eq!(session.edits().len(), 1);
    let displayed = session.displayed_grid();
    assert_eq!(displayed.get(key).activity, Some(clinic));
    assert_eq!(displayed.get(key).priority, 70);
    assert_eq!(displayed.get(key).notes.as_deref(), Some("prefers mornings"));
}

#[test]
fn overlay_is_idempotent() {
    let clinic = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am);
    let session = template_session()
        .apply(EditCommand::SelectPaintActivity(Some(clinic)))
        .apply(EditCommand::ClickSlot(key))
        .apply(EditCommand::SetPriority(key, 60));

    let once = session.displayed_grid();
    let twice = overlay(&once, &BTreeMap::new());
    assert_eq!(once, twice);
    assert_eq!(once, session.displayed_grid());
}

#[test]
fn edits_to_different_slots_commute() {
    let am_key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am);
    let pm_key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Pm);

    let forward = template_session()
        .apply(EditCommand::SetPriority(am_key, 10))
        .apply(EditCommand::SetPriority(pm_key, 90));
    let reverse = template_session()
        .apply(EditCommand::SetPriority(pm_key, 90))
        .apply(EditCommand::SetPriority(am_key, 10));

    assert_eq!(forward.displayed_grid(), reverse.displayed_grid());
}

#[test]
fn repeated_edits_to_one_slot_apply_in_call_order() {
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Tuesday, TimeOfDay::Pm);

    let session = template_session()
        .apply(EditCommand::SelectPaintActivity(Some(first)))
        .apply(EditCommand::ClickSlot(key))
        .apply(EditCommand::SelectPaintActivity(Some(second)))
        .apply(EditCommand::ClickSlot(key));

    assert_eq!(session.displayed_grid().get(key).activity, Some(second));
}

#[test]
fn cancel_restores_the_remote_grid_exactly() {
    let clinic = Uuid::new_v4();
    let remote = resolve_effective_week(
        &[TemplateSlot {
            activity: Some(clinic),
            ..TemplateSlot::empty(DayOfWeek::Monday, TimeOfDay::Am)
        }],
        &[],
        &ResolveTarget::default(),
    );
    let baseline = remote.clone();

    let session = EditSession::new(EditorMode::Template(Uuid::new_v4()), remote, None)
        .apply(EditCommand::SelectPaintActivity(Some(Uuid::new_v4())))
        .apply(EditCommand::ClickSlot(SlotKey::new(DayOfWeek::Monday, TimeOfDay::Pm)))
        .apply(EditCommand::ToggleLock(SlotKey::new(DayOfWeek::Friday, TimeOfDay::Am)))
        .apply(EditCommand::ClearSlot(SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am)))
        .apply(EditCommand::Cancel);

    assert_eq!(session.phase(), SessionPhase::Clean);
    assert!(!session.has_unsaved_changes());
    assert_eq!(session.displayed_grid(), baseline);
}

#[test]
fn commit_lifecycle_clears_edits_and_keeps_grid_value() {
    let clinic = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am);

    let session = template_session()
        .apply(EditCommand::SelectPaintActivity(Some(clinic)))
        .apply(EditCommand::ClickSlot(key));
    let displayed_before = session.displayed_grid();

    let session = session.apply(EditCommand::BeginCommit);
    assert_eq!(session.phase(), SessionPhase::Saving);

    // What the server would hand back after persisting the edits.
    let refetched = resolve_effective_week(
        &[TemplateSlot {
            activity: Some(clinic),
            ..TemplateSlot::empty(DayOfWeek::Monday, TimeOfDay::Am)
        }],
        &[],
        &ResolveTarget::default(),
    );
    let session = session.apply(EditCommand::CommitSucceeded(refetched));

    assert_eq!(session.phase(), SessionPhase::Clean);
    assert!(!session.has_unsaved_changes());
    // Value-stable: only provenance may differ after the round trip.
    let displayed_after = session.displayed_grid();
    assert_eq!(displayed_after.get(key).activity, displayed_before.get(key).activity);
    assert_eq!(displayed_after.get(key).locked, displayed_before.get(key).locked);
    assert_eq!(displayed_after.get(key).priority, displayed_before.get(key).priority);
}

#[test]
fn failed_commit_retains_edits_verbatim_for_retry() {
    let clinic = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am);

    let dirty = template_session()
        .apply(EditCommand::SelectPaintActivity(Some(clinic)))
        .apply(EditCommand::ClickSlot(key));
    let edits_before = dirty.edits().clone();

    let session = dirty
        .apply(EditCommand::BeginCommit)
        .apply(EditCommand::CommitFailed);

    assert_eq!(session.phase(), SessionPhase::Dirty);
    assert_eq!(session.edits(), &edits_before);
    assert_eq!(session.displayed_grid().get(key).activity, Some(clinic));
}

#[test]
fn saving_phase_blocks_mutations_and_cancel() {
    let clinic = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am);
    let other = SlotKey::new(DayOfWeek::Tuesday, TimeOfDay::Am);

    let saving = template_session()
        .apply(EditCommand::SelectPaintActivity(Some(clinic)))
        .apply(EditCommand::ClickSlot(key))
        .apply(EditCommand::BeginCommit);
    assert_eq!(saving.phase(), SessionPhase::Saving);

    let still_saving = saving
        .apply(EditCommand::ClickSlot(other))
        .apply(EditCommand::ToggleLock(other))
        .apply(EditCommand::SetPriority(other, 10))
        .apply(EditCommand::Cancel);

    assert_eq!(still_saving.phase(), SessionPhase::Saving);
    assert_eq!(still_saving.edits().len(), 1);
    assert!(still_saving.edits().contains_key(&key));
}

#[test]
fn all_day_paint_then_clear_leaves_morning_only() {
    let clinic = Uuid::new_v4();
    let am_key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am);
    let pm_key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Pm);

    let session = template_session()
        .apply(EditCommand::SelectPaintActivity(Some(clinic)))
        .apply(EditCommand::ClickSlot(am_key))
        .apply(EditCommand::ClickSlot(pm_key));

    // Both halves carry the same activity: one "all day Clinic" block.
    let displayed = session.displayed_grid();
    assert_eq!(displayed.get(am_key).activity, displayed.get(pm_key).activity);

    let session = session.apply(EditCommand::ClearSlot(pm_key));
    let displayed = session.displayed_grid();
    assert_eq!(displayed.get(am_key).activity, Some(clinic));
    assert_eq!(displayed.get(pm_key).activity, None);
}

#[test]
fn week_selection_is_ignored_while_same_pattern_flag_is_set() {
    let session = EditSession::new(
        EditorMode::Week(Uuid::new_v4()),
        EffectiveGrid::empty(),
        WeekNumber::new(2),
    )
    .apply(EditCommand::ToggleSamePatternAllWeeks);

    assert!(session.same_pattern_all_weeks());
    assert_eq!(session.selected_week(), None);

    let session = session.apply(EditCommand::SelectWeek(WeekNumber::new(4)));
    assert_eq!(session.selected_week(), None);
}
