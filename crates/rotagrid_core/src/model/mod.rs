//! Domain model for the layered weekly-pattern engine.
//!
//! # Responsibility
//! - Define canonical data structures shared by resolver, edit session and
//!   persistence.
//! - Keep slot identity, pattern rows, override rows and resolved slots in
//!   one place.
//!
//! # Invariants
//! - Every weekly grid is keyed by exactly 14 `SlotKey` values.
//! - Storage ordering is Sunday-first; display ordering never leaks into
//!   persisted shapes.

pub mod activity;
pub mod effective;
pub mod overrides;
pub mod slot;
pub mod template;
