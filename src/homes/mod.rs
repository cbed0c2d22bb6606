//! Player homes: the registry, per-scope caps, teleport costs and teleports.
//!
//! The host game supplies permissions, currency, zones and worlds through the traits in
//! [`ports`]; [`memory`] has in-memory versions of each.

pub mod capacity;
pub mod cost;
pub mod equation;
pub mod errors;
pub mod memory;
pub mod permissions;
pub mod ports;
pub mod registry;
pub mod service;
pub mod storage;
pub mod teleport;
pub mod types;

pub use capacity::{CapacityEnforcer, HomeCaps, OverwritePolicy};
pub use cost::{CostAggregation, CostCalculator, CostMode, CostScope, PermissionScopeCost, TeleportInputs};
pub use equation::{BuiltinEvaluator, Equation, EquationError};
pub use errors::{CapScope, HomeError};
pub use ports::{
    CurrencyService, EquationEvaluator, HostServices, PermissionService, PermissionStatus, WorldService,
    ZoneService,
};
pub use registry::HomeRegistry;
pub use service::{HomesService, LoadSummary};
pub use storage::{HomeStore, LoadReport};
pub use teleport::{TeleportReceipt, TeleportRequest, TeleportStage, TeleportTransaction};
pub use types::*;
