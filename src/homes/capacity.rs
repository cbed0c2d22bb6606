//! Home caps at server, world and zone scope.
//!
//! Caps come from permission arguments: a non-negative integer is the cap, a missing or
//! unparsable argument means unlimited. The server permission being absent altogether
//! means a cap of zero; the world or zone permission being absent is a missing-permission
//! failure for that scope.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::homes::errors::{CapScope, HomeError};
use crate::homes::permissions;
use crate::homes::ports::{PermissionService, ZoneService};
use crate::homes::types::{Location, PlayerHomeRecord, PlayerId, ZoneId};

/// How an overwrite of an existing home name is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwritePolicy {
    /// Overwrites never count against any cap.
    #[default]
    Exempt,
    /// Overwrites are checked against the scopes of the new location, with the
    /// overwritten home excluded from each count.
    CheckNewScope,
}

/// Parse a cap argument. `None` means unlimited.
pub fn parse_cap(argument: Option<&str>) -> Option<u32> {
    argument.and_then(|arg| arg.trim().parse::<u32>().ok())
}

/// Caps applying to one prospective home location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeCaps {
    pub server: Option<u32>,
    pub world_id: String,
    pub world: Option<u32>,
    /// In zone-iteration order.
    pub zones: Vec<(ZoneId, Option<u32>)>,
}

impl HomeCaps {
    pub fn is_unlimited(&self) -> bool {
        self.server.is_none() && self.world.is_none() && self.zones.iter().all(|(_, cap)| cap.is_none())
    }
}

pub struct CapacityEnforcer {
    permissions: Arc<dyn PermissionService>,
    zones: Arc<dyn ZoneService>,
    overwrite_policy: OverwritePolicy,
}

impl CapacityEnforcer {
    pub fn new(
        permissions: Arc<dyn PermissionService>,
        zones: Arc<dyn ZoneService>,
        overwrite_policy: OverwritePolicy,
    ) -> Self {
        Self {
            permissions,
            zones,
            overwrite_policy,
        }
    }

    /// Look up every cap that applies to a home at `location`.
    ///
    /// Only permission and zone lookups happen here, so callers can do this before
    /// taking the player's record lock.
    pub fn caps_for(&self, player: PlayerId, location: &Location) -> Result<HomeCaps, HomeError> {
        let server_status = self.permissions.status(player, permissions::PERMISSION_HOMES_ADD);
        let server = if server_status.granted {
            parse_cap(server_status.argument())
        } else {
            Some(0)
        };

        let world_key = permissions::add_in_world(&location.world_id);
        let world_status = self.permissions.status(player, &world_key);
        if !world_status.granted {
            return Err(HomeError::MissingPermission {
                player,
                permission: world_key,
            });
        }

        let mut zones = Vec::new();
        for zone in self.zones.zones_containing(location) {
            let zone_key = permissions::add_in_zone(&zone);
            let zone_status = self.permissions.status(player, &zone_key);
            if !zone_status.granted {
                return Err(HomeError::MissingPermission {
                    player,
                    permission: zone_key,
                });
            }
            zones.push((zone, parse_cap(zone_status.argument())));
        }

        Ok(HomeCaps {
            server,
            world_id: location.world_id.clone(),
            world: parse_cap(world_status.argument()),
            zones,
        })
    }

    /// Validate adding (or overwriting) `name` at `location` against `caps`.
    ///
    /// Must be called with the player's record locked and followed by the insert under
    /// the same lock. Of all violated scopes, the one with the smallest cap is reported;
    /// ties go to server, then world, then zones in iteration order. Zone membership of
    /// the existing homes is looked up here, under that lock.
    pub fn check(
        &self,
        record: &PlayerHomeRecord,
        name: &str,
        location: &Location,
        caps: &HomeCaps,
    ) -> Result<(), HomeError> {
        let existing = record.get(name);
        if existing.is_some() && self.overwrite_policy == OverwritePolicy::Exempt {
            return Ok(());
        }
        if caps.is_unlimited() {
            return Ok(());
        }

        let mut violations: Vec<(CapScope, u32)> = Vec::new();

        if let Some(cap) = caps.server {
            let held = record.len() - usize::from(existing.is_some());
            if held >= cap as usize {
                violations.push((CapScope::Server, cap));
            }
        }

        if let Some(cap) = caps.world {
            let overwritten_here = existing
                .map(|home| home.location.world_id == location.world_id)
                .unwrap_or(false);
            let held = record.count_in_world(&location.world_id) - usize::from(overwritten_here);
            if held >= cap as usize {
                violations.push((CapScope::World(caps.world_id.clone()), cap));
            }
        }

        if caps.zones.iter().any(|(_, cap)| cap.is_some()) {
            // Zone membership of each existing home, computed once per check.
            let memberships: Vec<(&str, Vec<ZoneId>)> = record
                .homes()
                .map(|home| (home.name.as_str(), self.zones.zones_containing(&home.location)))
                .collect();

            for (zone, cap) in &caps.zones {
                let Some(cap) = cap else { continue };
                let held = memberships
                    .iter()
                    .filter(|(home_name, zones)| *home_name != name && zones.contains(zone))
                    .count();
                if held >= *cap as usize {
                    violations.push((CapScope::Zone(zone.clone()), *cap));
                }
            }
        }

        match violations.into_iter().min_by_key(|(_, cap)| *cap) {
            Some((scope, cap)) => {
                debug!(
                    "Home {:?} for {} rejected: cap {} reached in {}",
                    name,
                    record.owner(),
                    cap,
                    scope
                );
                Err(HomeError::CapacityReached { scope, cap })
            }
            None => Ok(()),
        }
    }
}
