//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `rotagrid_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use rotagrid_core::{resolve_effective_week, ResolveTarget};

fn main() {
    // Resolving empty stores exercises the grid invariant end to end
    // without touching any storage.
    let grid = resolve_effective_week(&[], &[], &ResolveTarget::default());
    println!("rotagrid_core version={}", rotagrid_core::core_version());
    println!("rotagrid_core empty_grid_slots={}", grid.iter().count());
}
