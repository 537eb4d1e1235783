use chrono::NaiveDate;
use rotagrid_core::db::open_db_in_memory;
use rotagrid_core::{
    Activity, ActivityCategory, ActivityId, DayOfWeek, EditCommand, EditorError, EditorService,
    OverrideId, OverrideRequest, OverrideScope, OverrideSlot, PersonId, RepoError, RepoResult,
    Role, ScheduleRepository, SessionPhase, SlotKey, SlotSource, SqliteScheduleRepository,
    TemplateId, TemplateSlot, TemplateSlotRequest, TimeOfDay, WeekNumber,
};
use uuid::Uuid;

fn week_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

#[test]
fn template_mode_commit_persists_painted_slots() {
    let conn = open_db_in_memory().unwrap();
    let verify_repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let service = EditorService::new(SqliteScheduleRepository::try_new(&conn).unwrap());

    let clinic = Activity::new("Clinic", ActivityCategory::Clinical);
    verify_repo.create_activity(&clinic).unwrap();

    let template = Uuid::new_v4();
    let mut state = service
        .open_template_editor(template, Role::Coordinator)
        .unwrap();
    assert_eq!(state.palette.len(), 1);

    let am_key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am);
    let pm_key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Pm);
    state.session = state
        .session
        .clone()
        .apply(EditCommand::SelectPaintActivity(Some(clinic.id)))
        .apply(EditCommand::ClickSlot(am_key))
        .apply(EditCommand::ClickSlot(pm_key));

    service.commit(&mut state).unwrap();

    assert_eq!(state.session.phase(), SessionPhase::Clean);
    assert!(!state.session.has_unsaved_changes());

    let persisted = verify_repo.fetch_template(template).unwrap();
    assert_eq!(persisted.len(), 2);
    assert!(persisted.iter().all(|slot| slot.activity == Some(clinic.id)));

    let displayed = state.session.displayed_grid();
    assert_eq!(displayed.get(am_key).activity, Some(clinic.id));
    assert_eq!(displayed.get(am_key).source, Some(SlotSource::Template));
}

#[test]
fn commit_with_no_edits_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let service = EditorService::new(SqliteScheduleRepository::try_new(&conn).unwrap());

    let mut state = service
        .open_template_editor(Uuid::new_v4(), Role::Admin)
        .unwrap();
    service.commit(&mut state).unwrap();
    assert_eq!(state.session.phase(), SessionPhase::Clean);
}

#[test]
fn week_mode_commit_creates_week_scoped_overrides() {
    let conn = open_db_in_memory().unwrap();
    let verify_repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let service = EditorService::new(SqliteScheduleRepository::try_new(&conn).unwrap());

    let clinic = Activity::new("Clinic", ActivityCategory::Clinical);
    verify_repo.create_activity(&clinic).unwrap();

    let template = Uuid::new_v4();
    let person = Uuid::new_v4();
    let week = WeekNumber::new(2).unwrap();
    let mut state = service
        .open_week_editor(template, person, Role::Coordinator, week_start(), Some(week))
        .unwrap();

    let key = SlotKey::new(DayOfWeek::Tuesday, TimeOfDay::Am);
    state.session = state
        .session
        .clone()
        .apply(EditCommand::SelectPaintActivity(Some(clinic.id)))
        .apply(EditCommand::ClickSlot(key));

    service.commit(&mut state).unwrap();

    let overrides = verify_repo.fetch_overrides(person).unwrap();
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].scope, OverrideScope::Week(week));
    assert_eq!(overrides[0].activity, Some(clinic.id));

    let displayed = state.session.displayed_grid();
    assert_eq!(displayed.get(key).activity, Some(clinic.id));
    assert_eq!(displayed.get(key).source, Some(SlotSource::Override));
    assert_eq!(state.overrides.len(), 1);
}

#[test]
fn week_mode_recommit_replaces_rather_than_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let verify_repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let service = EditorService::new(SqliteScheduleRepository::try_new(&conn).unwrap());

    let clinic = Activity::new("Clinic", ActivityCategory::Clinical);
    let ward = Activity::new("Ward", ActivityCategory::Clinical);
    verify_repo.create_activity(&clinic).unwrap();
    verify_repo.create_activity(&ward).unwrap();

    let person = Uuid::new_v4();
    let week = WeekNumber::new(1).unwrap();
    let key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am);
    let mut state = service
        .open_week_editor(Uuid::new_v4(), person, Role::Admin, week_start(), Some(week))
        .unwrap();

    state.session = state
        .session
        .clone()
        .apply(EditCommand::SelectPaintActivity(Some(clinic.id)))
        .apply(EditCommand::ClickSlot(key));
    service.commit(&mut state).unwrap();

    state.session = state
        .session
        .clone()
        .apply(EditCommand::SelectPaintActivity(Some(ward.id)))
        .apply(EditCommand::ClickSlot(key));
    service.commit(&mut state).unwrap();

    let overrides = verify_repo.fetch_overrides(person).unwrap();
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].activity, Some(ward.id));
}

#[test]
fn same_pattern_flag_commits_all_weeks_overrides() {
    let conn = open_db_in_memory().unwrap();
    let verify_repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let service = EditorService::new(SqliteScheduleRepository::try_new(&conn).unwrap());

    let clinic = Activity::new("Clinic", ActivityCategory::Clinical);
    verify_repo.create_activity(&clinic).unwrap();

    let person = Uuid::new_v4();
    let mut state = service
        .open_week_editor(
            Uuid::new_v4(),
            person,
            Role::Admin,
            week_start(),
            Some(WeekNumber::new(3).unwrap()),
        )
        .unwrap();

    state.session = state
        .session
        .clone()
        .apply(EditCommand::ToggleSamePatternAllWeeks)
        .apply(EditCommand::SelectPaintActivity(Some(clinic.id)))
        .apply(EditCommand::ClickSlot(SlotKey::new(DayOfWeek::Wednesday, TimeOfDay::Am)));

    service.commit(&mut state).unwrap();

    let overrides = verify_repo.fetch_overrides(person).unwrap();
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].scope, OverrideScope::AllWeeks);
}

#[test]
fn week_mode_refuses_detail_edits_overrides_cannot_hold() {
    let conn = open_db_in_memory().unwrap();
    let verify_repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let service = EditorService::new(SqliteScheduleRepository::try_new(&conn).unwrap());

    let clinic = Activity::new("Clinic", ActivityCategory::Clinical);
    verify_repo.create_activity(&clinic).unwrap();

    let template = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am);
    verify_repo
        .update_template_slots(
            template,
            &[TemplateSlotRequest {
                day: key.day,
                time: key.time,
                activity: Some(clinic.id),
                locked: false,
                priority: 50,
                notes: None,
                activity_type_override: None,
            }],
            false,
        )
        .unwrap();

    let person = Uuid::new_v4();
    let mut state = service
        .open_week_editor(template, person, Role::Admin, week_start(), WeekNumber::new(1))
        .unwrap();

    state.session = state
        .session
        .clone()
        .apply(EditCommand::SetPriority(key, 70))
        .apply(EditCommand::SetNotes(key, Some("cover for leave".to_string())));
    assert_eq!(state.session.displayed_grid().get(key).priority, 70);

    match service.commit(&mut state) {
        Err(EditorError::UnsupportedEdit { key: reported }) => assert_eq!(reported, key),
        other => panic!("expected UnsupportedEdit, got {other:?}"),
    }

    // Refused up front: nothing written, nothing silently reverted.
    assert_eq!(state.session.phase(), SessionPhase::Dirty);
    assert_eq!(state.session.displayed_grid().get(key).priority, 70);
    assert_eq!(
        state.session.displayed_grid().get(key).notes.as_deref(),
        Some("cover for leave")
    );
    assert!(verify_repo.fetch_overrides(person).unwrap().is_empty());
}

#[test]
fn week_mode_commit_round_trip_is_value_stable() {
    let conn = open_db_in_memory().unwrap();
    let verify_repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let service = EditorService::new(SqliteScheduleRepository::try_new(&conn).unwrap());

    let clinic = Activity::new("Clinic", ActivityCategory::Clinical);
    let ward = Activity::new("Ward", ActivityCategory::Clinical);
    verify_repo.create_activity(&clinic).unwrap();
    verify_repo.create_activity(&ward).unwrap();

    let template = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Tuesday, TimeOfDay::Pm);
    verify_repo
        .update_template_slots(
            template,
            &[TemplateSlotRequest {
                day: key.day,
                time: key.time,
                activity: Some(clinic.id),
                locked: false,
                priority: 65,
                notes: None,
                activity_type_override: None,
            }],
            false,
        )
        .unwrap();

    let person = Uuid::new_v4();
    let mut state = service
        .open_week_editor(template, person, Role::Admin, week_start(), WeekNumber::new(2))
        .unwrap();

    state.session = state
        .session
        .clone()
        .apply(EditCommand::SelectPaintActivity(Some(ward.id)))
        .apply(EditCommand::ClickSlot(key));
    let before = state.session.displayed_grid();

    service.commit(&mut state).unwrap();
    assert_eq!(state.session.phase(), SessionPhase::Clean);

    // Value-stable round trip: only provenance may change.
    let after = state.session.displayed_grid();
    assert_eq!(after.get(key).activity, before.get(key).activity);
    assert_eq!(after.get(key).locked, before.get(key).locked);
    assert_eq!(after.get(key).priority, before.get(key).priority);
    assert_eq!(after.get(key).source, Some(SlotSource::Override));
}

#[test]
fn locked_slot_without_assignment_refuses_commit() {
    let conn = open_db_in_memory().unwrap();
    let service = EditorService::new(SqliteScheduleRepository::try_new(&conn).unwrap());

    let mut state = service
        .open_template_editor(Uuid::new_v4(), Role::Admin)
        .unwrap();

    let key = SlotKey::new(DayOfWeek::Thursday, TimeOfDay::Am);
    state.session = state.session.clone().apply(EditCommand::ToggleLock(key));

    match service.commit(&mut state) {
        Err(EditorError::InvalidEdit { key: reported }) => assert_eq!(reported, key),
        other => panic!("expected InvalidEdit, got {other:?}"),
    }

    // Refused before any write: still dirty, edits intact.
    assert_eq!(state.session.phase(), SessionPhase::Dirty);
    assert!(state.session.has_unsaved_changes());
}

#[test]
fn reload_discards_local_edits_explicitly() {
    let conn = open_db_in_memory().unwrap();
    let verify_repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let service = EditorService::new(SqliteScheduleRepository::try_new(&conn).unwrap());

    let clinic = Activity::new("Clinic", ActivityCategory::Clinical);
    verify_repo.create_activity(&clinic).unwrap();

    let mut state = service
        .open_template_editor(Uuid::new_v4(), Role::Admin)
        .unwrap();
    let baseline = state.session.remote_grid().clone();

    state.session = state
        .session
        .clone()
        .apply(EditCommand::SelectPaintActivity(Some(clinic.id)))
        .apply(EditCommand::ClickSlot(SlotKey::new(DayOfWeek::Friday, TimeOfDay::Pm)));
    assert!(state.session.has_unsaved_changes());

    service.reload(&mut state).unwrap();
    assert!(!state.session.has_unsaved_changes());
    assert_eq!(state.session.displayed_grid(), baseline);
}

/// Error-injecting stub: reads succeed with empty stores, writes fail.
struct FailingWriteRepo;

impl ScheduleRepository for FailingWriteRepo {
    fn create_activity(&self, activity: &Activity) -> RepoResult<ActivityId> {
        Ok(activity.id)
    }

    fn fetch_permitted_activities(&self, _role: Role) -> RepoResult<Vec<Activity>> {
        Ok(Vec::new())
    }

    fn fetch_template(&self, _template: TemplateId) -> RepoResult<Vec<TemplateSlot>> {
        Ok(Vec::new())
    }

    fn update_template_slots(
        &self,
        _template: TemplateId,
        _slots: &[TemplateSlotRequest],
        _clear_existing: bool,
    ) -> RepoResult<()> {
        Err(RepoError::InvalidData("injected write failure".to_string()))
    }

    fn fetch_overrides(&self, _person: PersonId) -> RepoResult<Vec<OverrideSlot>> {
        Ok(Vec::new())
    }

    fn create_override(
        &self,
        _person: PersonId,
        _request: &OverrideRequest,
    ) -> RepoResult<OverrideId> {
        Err(RepoError::InvalidData("injected write failure".to_string()))
    }

    fn delete_override(&self, _id: OverrideId) -> RepoResult<()> {
        Err(RepoError::InvalidData("injected write failure".to_string()))
    }
}

#[test]
fn failed_commit_keeps_session_dirty_with_edits_intact() {
    let service = EditorService::new(FailingWriteRepo);

    let clinic_id = Uuid::new_v4();
    let key = SlotKey::new(DayOfWeek::Monday, TimeOfDay::Am);
    let mut state = service
        .open_template_editor(Uuid::new_v4(), Role::Admin)
        .unwrap();

    state.session = state
        .session
        .clone()
        .apply(EditCommand::SelectPaintActivity(Some(clinic_id)))
        .apply(EditCommand::ClickSlot(key));

    match service.commit(&mut state) {
        Err(EditorError::Commit(RepoError::InvalidData(message))) => {
            assert!(message.contains("injected"));
        }
        other => panic!("expected commit failure, got {other:?}"),
    }

    assert_eq!(state.session.phase(), SessionPhase::Dirty);
    assert!(state.session.has_unsaved_changes());
    assert_eq!(state.session.displayed_grid().get(key).activity, Some(clinic_id));

    // Retry against the same failing backend fails the same way; the
    // user's work is still there.
    assert!(service.commit(&mut state).is_err());
    assert!(state.session.has_unsaved_changes());
}
