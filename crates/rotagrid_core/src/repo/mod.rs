//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the schedule persistence contract consumed by the editor
//!   service.
//! - Isolate SQLite query details from resolution and session logic.
//!
//! # Invariants
//! - Repository writes clamp/validate before SQL mutations.
//! - Repository reads reject invalid persisted state instead of masking it.

pub mod schedule_repo;
