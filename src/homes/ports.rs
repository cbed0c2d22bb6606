//! Host-game services the homes subsystem depends on.
//!
//! All calls are synchronous and may block. Implementations must be thread-safe
//! (Send + Sync).
//!
//! Teleports and cost lookups call these services with no registry lock held. Capacity
//! checks are the exception: the zone lookups for a player's existing homes run under
//! that player's record lock, so the check and the insert stay one atomic step. A
//! [`ZoneService`] must therefore never call back into the homes registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::homes::equation::EquationError;
use crate::homes::errors::HomeError;
use crate::homes::types::{CostLedger, Location, Orientation, PlayerId, Position, ZoneId};

/// Result of looking up one permission for one player.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionStatus {
    pub permission: String,
    pub granted: bool,
    pub argument: Option<String>,
}

impl PermissionStatus {
    pub fn denied(permission: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
            granted: false,
            argument: None,
        }
    }

    pub fn granted(permission: impl Into<String>, argument: Option<String>) -> Self {
        Self {
            permission: permission.into(),
            granted: true,
            argument,
        }
    }

    /// The argument, if the permission is granted and carries one.
    pub fn argument(&self) -> Option<&str> {
        if self.granted {
            self.argument.as_deref()
        } else {
            None
        }
    }
}

pub trait PermissionService: Send + Sync {
    fn status(&self, player: PlayerId, permission: &str) -> PermissionStatus;

    fn has(&self, player: PlayerId, permission: &str) -> bool {
        self.status(player, permission).granted
    }
}

pub trait CurrencyService: Send + Sync {
    /// Deduct every amount in the ledger, or nothing.
    ///
    /// Returns `Ok(false)` when the player cannot afford the whole ledger, and
    /// [`HomeError::UnrecognisedCurrency`] when a ledger entry names an unknown currency.
    fn charge(&self, player: PlayerId, ledger: &CostLedger) -> Result<bool, HomeError>;

    /// Give back a ledger that was previously charged.
    fn refund(&self, player: PlayerId, ledger: &CostLedger) -> Result<(), HomeError>;
}

pub trait ZoneService: Send + Sync {
    /// Zones containing the location, in a stable order.
    fn zones_containing(&self, location: &Location) -> Vec<ZoneId>;
}

pub trait WorldService: Send + Sync {
    fn world_exists(&self, world_id: &str) -> bool;

    /// Current location of an online player; `None` when offline.
    fn player_location(&self, player: PlayerId) -> Option<Location>;

    fn move_entity(
        &self,
        player: PlayerId,
        world_id: &str,
        position: Position,
        orientation: Orientation,
    ) -> Result<(), String>;
}

pub trait EquationEvaluator: Send + Sync {
    fn evaluate(
        &self,
        expression: &str,
        variables: &HashMap<&str, f64>,
    ) -> Result<f64, EquationError>;
}

/// The full set of host services, shared by the registry-facing components.
#[derive(Clone)]
pub struct HostServices {
    pub permissions: Arc<dyn PermissionService>,
    pub currency: Arc<dyn CurrencyService>,
    pub zones: Arc<dyn ZoneService>,
    pub worlds: Arc<dyn WorldService>,
    pub equations: Arc<dyn EquationEvaluator>,
}
