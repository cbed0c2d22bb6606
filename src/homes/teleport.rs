//! Teleport transactions.
//!
//! A teleport moves through fixed gates and stops at the first one that fails:
//!
//! ```text
//! Start -> PermissionChecked -> CostComputed -> Charged -> Moved
//! ```
//!
//! Charging is the last step before the move. If the host still fails to move the
//! player, the charged ledger is refunded, so a player is never charged without moving.

use std::fmt;

use log::{debug, error, info};

use crate::homes::cost::CostCalculator;
use crate::homes::errors::HomeError;
use crate::homes::permissions;
use crate::homes::ports::HostServices;
use crate::homes::registry::HomeRegistry;
use crate::homes::types::{CostLedger, HomeEntry, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeleportStage {
    Start,
    PermissionChecked,
    CostComputed,
    Charged,
    Moved,
}

impl fmt::Display for TeleportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TeleportStage::Start => "start",
            TeleportStage::PermissionChecked => "permission checked",
            TeleportStage::CostComputed => "cost computed",
            TeleportStage::Charged => "charged",
            TeleportStage::Moved => "moved",
        };
        write!(f, "{}", name)
    }
}

/// Who is moving, whose home they are going to, and on what authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeleportRequest {
    /// A player going to one of their own homes, paying the cost.
    Own { player: PlayerId, home: String },
    /// An admin going to somebody else's home. No cost.
    ToHomeOf {
        actor: PlayerId,
        owner: PlayerId,
        home: String,
    },
    /// An admin sending `traveller` to `owner`'s home. No cost.
    OtherToHomeOf {
        actor: PlayerId,
        traveller: PlayerId,
        owner: PlayerId,
        home: String,
    },
}

impl TeleportRequest {
    pub fn traveller(&self) -> PlayerId {
        match self {
            TeleportRequest::Own { player, .. } => *player,
            TeleportRequest::ToHomeOf { actor, .. } => *actor,
            TeleportRequest::OtherToHomeOf { traveller, .. } => *traveller,
        }
    }

    pub fn owner(&self) -> PlayerId {
        match self {
            TeleportRequest::Own { player, .. } => *player,
            TeleportRequest::ToHomeOf { owner, .. } => *owner,
            TeleportRequest::OtherToHomeOf { owner, .. } => *owner,
        }
    }

    pub fn home_name(&self) -> &str {
        match self {
            TeleportRequest::Own { home, .. }
            | TeleportRequest::ToHomeOf { home, .. }
            | TeleportRequest::OtherToHomeOf { home, .. } => home,
        }
    }

    /// The admin permission this request needs, if any.
    fn admin_permission(&self) -> Option<(PlayerId, &'static str)> {
        match self {
            TeleportRequest::Own { .. } => None,
            TeleportRequest::ToHomeOf { actor, .. } => {
                Some((*actor, permissions::PERMISSION_HOMES_ADMIN_TP_ME))
            }
            TeleportRequest::OtherToHomeOf {
                actor,
                traveller,
                owner,
                ..
            } => {
                let key = if traveller == owner {
                    permissions::PERMISSION_HOMES_ADMIN_TP_THEM
                } else {
                    permissions::PERMISSION_HOMES_ADMIN_TP_OTHER
                };
                Some((*actor, key))
            }
        }
    }
}

/// What a completed teleport did.
#[derive(Debug, Clone, PartialEq)]
pub struct TeleportReceipt {
    pub traveller: PlayerId,
    pub home: HomeEntry,
    pub charged: CostLedger,
}

pub struct TeleportTransaction<'a> {
    registry: &'a HomeRegistry,
    services: &'a HostServices,
    costs: &'a CostCalculator,
    request: TeleportRequest,
    stage: TeleportStage,
}

impl<'a> TeleportTransaction<'a> {
    pub fn new(
        registry: &'a HomeRegistry,
        services: &'a HostServices,
        costs: &'a CostCalculator,
        request: TeleportRequest,
    ) -> Self {
        Self {
            registry,
            services,
            costs,
            request,
            stage: TeleportStage::Start,
        }
    }

    pub fn stage(&self) -> TeleportStage {
        self.stage
    }

    /// Run every gate. On failure the transaction stays at the last stage it reached.
    pub fn execute(&mut self) -> Result<TeleportReceipt, HomeError> {
        let result = self.run();
        if let Err(e) = &result {
            debug!(
                "Teleport of {} to {:?} aborted after stage '{}': {}",
                self.request.traveller(),
                self.request.home_name(),
                self.stage,
                e
            );
        }
        result
    }

    fn run(&mut self) -> Result<TeleportReceipt, HomeError> {
        let owner = self.request.owner();
        let traveller = self.request.traveller();
        let home_name = self.request.home_name().to_string();

        let home = self
            .registry
            .get_home(owner, &home_name)
            .ok_or_else(|| HomeError::NotFound {
                player: owner,
                home: home_name.clone(),
            })?;

        let worlds = &self.services.worlds;
        if !worlds.world_exists(&home.location.world_id) {
            return Err(HomeError::NoSuchWorld(home.location.world_id.clone()));
        }

        let origin = worlds.player_location(traveller);
        if origin.is_none() {
            return Err(HomeError::PlayerOffline(traveller));
        }

        let ledger = match self.request.admin_permission() {
            Some((actor, key)) => {
                if !self.services.permissions.has(actor, key) {
                    return Err(HomeError::MissingPermission {
                        player: actor,
                        permission: key.to_string(),
                    });
                }
                self.stage = TeleportStage::PermissionChecked;
                CostLedger::new()
            }
            None => {
                let ledger = self
                    .costs
                    .request_cost(owner, origin.as_ref(), &home.location)?;
                self.stage = TeleportStage::PermissionChecked;
                ledger
            }
        };
        self.stage = TeleportStage::CostComputed;

        if !ledger.is_empty() && !self.services.currency.charge(traveller, &ledger)? {
            return Err(HomeError::InsufficientFunds { ledger });
        }
        self.stage = TeleportStage::Charged;

        let location = &home.location;
        if let Err(reason) = worlds.move_entity(
            traveller,
            &location.world_id,
            location.position,
            location.orientation,
        ) {
            if !ledger.is_empty() {
                if let Err(e) = self.services.currency.refund(traveller, &ledger) {
                    error!(
                        "Teleport of {} failed and the refund of {} also failed: {}",
                        traveller, ledger, e
                    );
                }
            }
            return Err(HomeError::MoveFailed(reason));
        }
        self.stage = TeleportStage::Moved;

        info!(
            "Teleported {} to home {:?} of {} (cost: {})",
            traveller,
            home.display_name(),
            owner,
            ledger
        );
        Ok(TeleportReceipt {
            traveller,
            home,
            charged: ledger,
        })
    }
}
