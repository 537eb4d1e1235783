//! Schedule persistence contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the durable pattern/override/palette stores behind one trait.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `create_override` enforces uniqueness per (person, scope, day, time):
//!   a colliding existing row is replaced within the same transaction.
//! - Read paths reject invalid persisted state with `InvalidData` instead
//!   of silently degrading; degradation is the resolver's job, not the
//!   repository's.

use crate::db::{latest_version, DbError};
use crate::model::activity::{Activity, ActivityCategory, ActivityId, Role};
use crate::model::overrides::{OverrideId, OverrideRequest, OverrideScope, OverrideSlot, PersonId};
use crate::model::slot::{DayOfWeek, TimeOfDay, WeekNumber};
use crate::model::template::{clamp_priority, TemplateId, TemplateSlot, TemplateSlotRequest};
use chrono::NaiveDate;
use log::info;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TEMPLATE_SELECT_SQL: &str = "SELECT
    day_of_week,
    time_of_day,
    activity_uuid,
    is_locked,
    priority,
    notes,
    activity_type_override
FROM template_slots";

const OVERRIDE_SELECT_SQL: &str = "SELECT
    uuid,
    person_uuid,
    effective_date,
    week_number,
    day_of_week,
    time_of_day,
    activity_uuid,
    is_locked,
    reason
FROM slot_overrides";

const REQUIRED_TABLES: [&str; 3] = ["activities", "template_slots", "slot_overrides"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for schedule persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted schedule data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection not migrated: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table: {table}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for the weekly-pattern stores.
///
/// The editor service is the only caller; it batches session deltas into
/// these operations on commit.
pub trait ScheduleRepository {
    fn create_activity(&self, activity: &Activity) -> RepoResult<ActivityId>;
    /// Palette listing filtered by caller role; a role must never receive
    /// an activity it cannot assign.
    fn fetch_permitted_activities(&self, role: Role) -> RepoResult<Vec<Activity>>;
    fn fetch_template(&self, template: TemplateId) -> RepoResult<Vec<TemplateSlot>>;
    /// Bulk template write. With `clear_existing`, rows absent from
    /// `slots` are removed; otherwise they are left untouched.
    fn update_template_slots(
        &self,
        template: TemplateId,
        slots: &[TemplateSlotRequest],
        clear_existing: bool,
    ) -> RepoResult<()>;
    fn fetch_overrides(&self, person: PersonId) -> RepoResult<Vec<OverrideSlot>>;
    fn create_override(&self, person: PersonId, request: &OverrideRequest)
        -> RepoResult<OverrideId>;
    fn delete_override(&self, id: OverrideId) -> RepoResult<()>;
}

/// SQLite-backed schedule repository.
pub struct SqliteScheduleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScheduleRepository<'conn> {
    /// Wraps a connection after verifying schema readiness.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        for table in REQUIRED_TABLES {
            let present: bool = conn.query_row(
                "SELECT EXISTS (
                    SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
                );",
                [table],
                |row| row.get(0),
            )?;
            if !present {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }

        Ok(Self { conn })
    }
}

impl ScheduleRepository for SqliteScheduleRepository<'_> {
    fn create_activity(&self, activity: &Activity) -> RepoResult<ActivityId> {
        if activity.name.trim().is_empty() {
            return Err(RepoError::InvalidData(
                "activity name must not be blank".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT INTO activities (uuid, name, category, restricted)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                activity.id.to_string(),
                activity.name.as_str(),
                activity.category.as_str(),
                bool_to_int(activity.restricted),
            ],
        )?;

        Ok(activity.id)
    }

    fn fetch_permitted_activities(&self, role: Role) -> RepoResult<Vec<Activity>> {
        if role == Role::Viewer {
            return Ok(Vec::new());
        }

        let mut sql = "SELECT uuid, name, category, restricted FROM activities".to_string();
        if role == Role::Coordinator {
            sql.push_str(" WHERE restricted = 0");
        }
        sql.push_str(" ORDER BY name ASC, uuid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut activities = Vec::new();

        while let Some(row) = rows.next()? {
            let activity = parse_activity_row(row)?;
            // Belt and braces: the SQL filter and the role gate must agree.
            if role.can_assign(&activity) {
                activities.push(activity);
            }
        }

        Ok(activities)
    }

    fn fetch_template(&self, template: TemplateId) -> RepoResult<Vec<TemplateSlot>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TEMPLATE_SELECT_SQL}
             WHERE template_uuid = ?1
             ORDER BY day_of_week ASC, time_of_day ASC;"
        ))?;

        let mut rows = stmt.query([template.to_string()])?;
        let mut slots = Vec::new();
        while let Some(row) = rows.next()? {
            slots.push(parse_template_row(row)?);
        }

        Ok(slots)
    }

    fn update_template_slots(
        &self,
        template: TemplateId,
        slots: &[TemplateSlotRequest],
        clear_existing: bool,
    ) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        if clear_existing {
            tx.execute(
                "DELETE FROM template_slots WHERE template_uuid = ?1;",
                [template.to_string()],
            )?;
        }

        for slot in slots {
            tx.execute(
                "INSERT INTO template_slots (
                    template_uuid,
                    day_of_week,
                    time_of_day,
                    activity_uuid,
                    is_locked,
                    priority,
                    notes,
                    activity_type_override
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT (template_uuid, day_of_week, time_of_day)
                DO UPDATE SET
                    activity_uuid = excluded.activity_uuid,
                    is_locked = excluded.is_locked,
                    priority = excluded.priority,
                    notes = excluded.notes,
                    activity_type_override = excluded.activity_type_override,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![
                    template.to_string(),
                    slot.day.index(),
                    slot.time.as_str(),
                    slot.activity.map(|id| id.to_string()),
                    bool_to_int(slot.locked),
                    clamp_priority(slot.priority),
                    slot.notes.as_deref(),
                    slot.activity_type_override.as_deref(),
                ],
            )?;
        }

        tx.commit()?;

        info!(
            "event=template_update module=repo status=ok template={} slots={} clear_existing={}",
            template,
            slots.len(),
            clear_existing
        );
        Ok(())
    }

    fn fetch_overrides(&self, person: PersonId) -> RepoResult<Vec<OverrideSlot>> {
        let mut stmt = self.conn.prepare(&format!(
            "{OVERRIDE_SELECT_SQL}
             WHERE person_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;"
        ))?;

        let mut rows = stmt.query([person.to_string()])?;
        let mut overrides = Vec::new();
        while let Some(row) = rows.next()? {
            overrides.push(parse_override_row(row)?);
        }

        Ok(overrides)
    }

    fn create_override(
        &self,
        person: PersonId,
        request: &OverrideRequest,
    ) -> RepoResult<OverrideId> {
        let id = Uuid::new_v4();
        let (effective_date, week_number) = scope_to_db(request.scope);

        let tx = self.conn.unchecked_transaction()?;

        // Uniqueness per (person, scope, day, time): replace any existing
        // override for the same scope and slot.
        let replaced = tx.execute(
            "DELETE FROM slot_overrides
             WHERE person_uuid = ?1
               AND effective_date IS ?2
               AND week_number IS ?3
               AND day_of_week = ?4
               AND time_of_day = ?5;",
            params![
                person.to_string(),
                effective_date.as_deref(),
                week_number,
                request.day.index(),
                request.time.as_str(),
            ],
        )?;

        tx.execute(
            "INSERT INTO slot_overrides (
                uuid,
                person_uuid,
                effective_date,
                week_number,
                day_of_week,
                time_of_day,
                activity_uuid,
                is_locked,
                reason
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                id.to_string(),
                person.to_string(),
                effective_date.as_deref(),
                week_number,
                request.day.index(),
                request.time.as_str(),
                request.activity.map(|a| a.to_string()),
                bool_to_int(request.locked),
                request.reason.as_deref(),
            ],
        )?;

        tx.commit()?;

        info!(
            "event=override_create module=repo status=ok person={person} slot={} replaced={replaced}",
            request.key()
        );
        Ok(id)
    }

    fn delete_override(&self, id: OverrideId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM slot_overrides WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        info!("event=override_delete module=repo status=ok id={id}");
        Ok(())
    }
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<Activity> {
    let id = parse_uuid_column(row, "uuid", "activities.uuid")?;

    let category_text: String = row.get("category")?;
    let category = ActivityCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in activities.category"
        ))
    })?;

    Ok(Activity {
        id,
        name: row.get("name")?,
        category,
        restricted: parse_bool_column(row, "restricted", "activities.restricted")?,
    })
}

fn parse_template_row(row: &Row<'_>) -> RepoResult<TemplateSlot> {
    let (day, time) = parse_slot_columns(row, "template_slots")?;

    let priority: i64 = row.get("priority")?;
    let priority = u8::try_from(priority).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority}` in template_slots.priority"
        ))
    })?;

    Ok(TemplateSlot {
        day,
        time,
        activity: parse_optional_uuid_column(row, "activity_uuid", "template_slots.activity_uuid")?,
        locked: parse_bool_column(row, "is_locked", "template_slots.is_locked")?,
        priority: clamp_priority(priority),
        notes: row.get("notes")?,
        activity_type_override: row.get("activity_type_override")?,
    })
}

fn parse_override_row(row: &Row<'_>) -> RepoResult<OverrideSlot> {
    let (day, time) = parse_slot_columns(row, "slot_overrides")?;

    let effective_date: Option<String> = row.get("effective_date")?;
    let week_number: Option<i64> = row.get("week_number")?;
    let scope = match (effective_date, week_number) {
        (None, None) => OverrideScope::AllWeeks,
        (None, Some(week)) => {
            let week = u8::try_from(week)
                .ok()
                .and_then(WeekNumber::new)
                .ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "invalid week number `{week}` in slot_overrides.week_number"
                    ))
                })?;
            OverrideScope::Week(week)
        }
        (Some(date_text), None) => {
            let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d").map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid date `{date_text}` in slot_overrides.effective_date"
                ))
            })?;
            OverrideScope::Date(date)
        }
        (Some(_), Some(_)) => {
            return Err(RepoError::InvalidData(
                "override row carries both effective_date and week_number".to_string(),
            ));
        }
    };

    Ok(OverrideSlot {
        id: parse_uuid_column(row, "uuid", "slot_overrides.uuid")?,
        person: parse_uuid_column(row, "person_uuid", "slot_overrides.person_uuid")?,
        scope,
        day,
        time,
        activity: parse_optional_uuid_column(row, "activity_uuid", "slot_overrides.activity_uuid")?,
        locked: parse_bool_column(row, "is_locked", "slot_overrides.is_locked")?,
        reason: row.get("reason")?,
    })
}

fn parse_slot_columns(row: &Row<'_>, table: &str) -> RepoResult<(DayOfWeek, TimeOfDay)> {
    let day_index: i64 = row.get("day_of_week")?;
    let day = u8::try_from(day_index)
        .ok()
        .and_then(DayOfWeek::from_index)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid day `{day_index}` in {table}.day_of_week"
            ))
        })?;

    let time_text: String = row.get("time_of_day")?;
    let time = match time_text.as_str() {
        "AM" => TimeOfDay::Am,
        "PM" => TimeOfDay::Pm,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid time `{other}` in {table}.time_of_day"
            )));
        }
    };

    Ok((day, time))
}

fn parse_uuid_column(row: &Row<'_>, column: &str, qualified: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {qualified}")))
}

fn parse_optional_uuid_column(
    row: &Row<'_>,
    column: &str,
    qualified: &str,
) -> RepoResult<Option<Uuid>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => Uuid::parse_str(&text).map(Some).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{text}` in {qualified}"))
        }),
        None => Ok(None),
    }
}

fn parse_bool_column(row: &Row<'_>, column: &str, qualified: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {qualified}"
        ))),
    }
}

fn scope_to_db(scope: OverrideScope) -> (Option<String>, Option<u8>) {
    match scope {
        OverrideScope::AllWeeks => (None, None),
        OverrideScope::Week(week) => (None, Some(week.get())),
        OverrideScope::Date(date) => (Some(date.format("%Y-%m-%d").to_string()), None),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
