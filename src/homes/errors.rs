use std::fmt;

use thiserror::Error;

use crate::homes::types::{CostLedger, PlayerId};

/// Scope at which a home cap applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CapScope {
    Server,
    World(String),
    Zone(String),
}

impl fmt::Display for CapScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapScope::Server => write!(f, "this server"),
            CapScope::World(world) => write!(f, "the world {}", world),
            CapScope::Zone(zone) => write!(f, "the zone {}", zone),
        }
    }
}

/// Errors that can arise while managing homes or teleporting to them.
///
/// None of the user-triggered variants are produced after the registry has been mutated,
/// so a caller receiving one can assume nothing changed.
#[derive(Debug, Error)]
pub enum HomeError {
    /// The player has no home by that name.
    #[error("no home named {home:?} for player {player}")]
    NotFound { player: PlayerId, home: String },

    /// The player has no homes at all.
    #[error("player {0} has no homes")]
    PlayerNotFound(PlayerId),

    /// The home points at a world that is not currently loaded.
    #[error("no such world: {0}")]
    NoSuchWorld(String),

    /// The player lacks the permission guarding a scope.
    #[error("player {player} is missing permission {permission}")]
    MissingPermission { player: PlayerId, permission: String },

    /// Creating another home would exceed the cap for a scope.
    #[error("home cap reached: {cap} allowed in {scope}")]
    CapacityReached { scope: CapScope, cap: u32 },

    /// The player could not pay the full cost. Nothing was deducted.
    #[error("insufficient funds, teleport costs {ledger}")]
    InsufficientFunds { ledger: CostLedger },

    /// The currency service does not know one of the ledger's currencies.
    #[error("unrecognised currency: {0}")]
    UnrecognisedCurrency(String),

    /// A persisted home row could not be parsed (load-time only).
    #[error("malformed home record on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// Writing the homes file failed; the previous file was restored where possible.
    #[error("could not save homes: {0}")]
    SaveFailed(String),

    /// The acting player is not online, so their location is unknown.
    #[error("player {0} is not online")]
    PlayerOffline(PlayerId),

    /// The host refused to move the entity.
    #[error("teleport failed: {0}")]
    MoveFailed(String),

    /// Wrapper around IO errors (directory creation, renames, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around CSV reader/writer errors.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
