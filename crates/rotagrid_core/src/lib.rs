//! Layered weekly-pattern resolution core.
//! This crate is the single source of truth for effective-slot merging and
//! edit-session invariants; UI chrome and transport live elsewhere.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod resolve;
pub mod service;
pub mod session;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::activity::{Activity, ActivityCategory, ActivityId, Role};
pub use model::effective::{EffectiveGrid, EffectiveSlot, SlotSource};
pub use model::overrides::{
    OverrideId, OverrideRequest, OverrideScope, OverrideSlot, PersonId,
};
pub use model::slot::{
    DayOfWeek, SlotKey, SlotKeyParseError, TimeOfDay, WeekNumber, ALL_SLOT_KEYS, DISPLAY_ORDER,
    SLOT_COUNT,
};
pub use model::template::{
    clamp_priority, TemplateId, TemplateSlot, TemplateSlotRequest, DEFAULT_PRIORITY,
};
pub use repo::schedule_repo::{
    RepoError, RepoResult, ScheduleRepository, SqliteScheduleRepository,
};
pub use resolve::{resolve_effective_week, ResolveTarget};
pub use service::editor_service::{
    build_commit_plan, CommitPlan, EditorError, EditorService, EditorState,
};
pub use session::overlay::{overlay, overlay_slot, SlotEdit};
pub use session::{EditCommand, EditSession, EditorMode, SessionPhase};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
