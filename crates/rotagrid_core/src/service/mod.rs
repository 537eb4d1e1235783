//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, resolver and edit-session calls into
//!   editor-level APIs.
//! - Keep UI layers decoupled from storage and resolution details.

pub mod editor_service;
