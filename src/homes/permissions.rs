//! Permission keys consulted by the homes subsystem.
//!
//! Scope-specific keys are formed by appending `.<world id>` or `.<zone name>` to one of
//! the prefixes below. Arguments on the `add` family are home caps; arguments on the `tp`
//! family are cost specifications (see [`crate::homes::cost`]).

/// Server-wide home cap.
pub const PERMISSION_HOMES_ADD: &str = "homes.personal.add";
pub const PERMISSION_HOMES_ADD_INWORLD: &str = "homes.personal.add.inworld";
pub const PERMISSION_HOMES_ADD_INZONE: &str = "homes.personal.add.inzone";
pub const PERMISSION_HOMES_TP_TOWORLD: &str = "homes.personal.tp.toworld";
pub const PERMISSION_HOMES_TP_TOZONE: &str = "homes.personal.tp.tozone";
pub const PERMISSION_HOMES_TP_FROMWORLD: &str = "homes.personal.tp.fromworld";
pub const PERMISSION_HOMES_TP_FROMZONE: &str = "homes.personal.tp.fromzone";
/// Teleport yourself to another player's home.
pub const PERMISSION_HOMES_ADMIN_TP_ME: &str = "homes.admin.tp.me";
/// Send a player to one of their own homes.
pub const PERMISSION_HOMES_ADMIN_TP_THEM: &str = "homes.admin.tp.them";
/// Send a player to somebody else's home.
pub const PERMISSION_HOMES_ADMIN_TP_OTHER: &str = "homes.admin.tp.other";

/// Join a permission prefix and a world or zone name.
pub fn scoped(prefix: &str, scope: &str) -> String {
    format!("{}.{}", prefix, scope)
}

pub fn add_in_world(world_id: &str) -> String {
    scoped(PERMISSION_HOMES_ADD_INWORLD, world_id)
}

pub fn add_in_zone(zone: &str) -> String {
    scoped(PERMISSION_HOMES_ADD_INZONE, zone)
}

pub fn tp_to_world(world_id: &str) -> String {
    scoped(PERMISSION_HOMES_TP_TOWORLD, world_id)
}

pub fn tp_to_zone(zone: &str) -> String {
    scoped(PERMISSION_HOMES_TP_TOZONE, zone)
}

pub fn tp_from_world(world_id: &str) -> String {
    scoped(PERMISSION_HOMES_TP_FROMWORLD, world_id)
}

pub fn tp_from_zone(zone: &str) -> String {
    scoped(PERMISSION_HOMES_TP_FROMZONE, zone)
}
