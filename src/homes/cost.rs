//! Teleport cost computation.
//!
//! Each teleport touches up to four kinds of permission scope: the origin world, every
//! zone containing the origin, the destination world, and every zone containing the
//! destination. A granted scope permission may carry a cost argument: newline-separated
//! `currency: equation` lines, where a bare equation is charged in the default currency.
//!
//! ```text
//! gold: 5 + distance / 100
//! xp: isAcrossWorlds * 30
//! 2
//! ```
//!
//! Within one scope a repeated currency keeps its largest value. Across scopes the
//! per-scope ledgers are combined with the configured [`CostAggregation`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::homes::errors::HomeError;
use crate::homes::permissions;
use crate::homes::ports::{EquationEvaluator, PermissionService, PermissionStatus, ZoneService};
use crate::homes::types::{CostLedger, Location, PlayerId};
use crate::logutil::escape_log;

pub const DISTANCE_VARIABLE: &str = "distance";
pub const ACROSS_WORLDS_VARIABLE: &str = "isAcrossWorlds";

/// How per-scope ledgers combine into the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostAggregation {
    /// Every applicable scope charges its own cost.
    #[default]
    Sum,
    /// Only the most expensive scope per currency is charged.
    Max,
}

/// Whether missing scope permissions abort the computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostMode {
    Enforce,
    Preview,
}

/// One permission scope consulted for a teleport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostScope {
    FromWorld(String),
    FromZone(String),
    ToWorld(String),
    ToZone(String),
}

impl CostScope {
    pub fn permission_key(&self) -> String {
        match self {
            CostScope::FromWorld(world) => permissions::tp_from_world(world),
            CostScope::FromZone(zone) => permissions::tp_from_zone(zone),
            CostScope::ToWorld(world) => permissions::tp_to_world(world),
            CostScope::ToZone(zone) => permissions::tp_to_zone(zone),
        }
    }
}

impl fmt::Display for CostScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostScope::FromWorld(world) => write!(f, "from world {}", world),
            CostScope::FromZone(zone) => write!(f, "from zone {}", zone),
            CostScope::ToWorld(world) => write!(f, "to world {}", world),
            CostScope::ToZone(zone) => write!(f, "to zone {}", zone),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostLine {
    pub currency: String,
    pub equation: String,
}

/// A cost argument split into its `currency: equation` lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionScopeCost {
    pub lines: Vec<CostLine>,
}

impl PermissionScopeCost {
    /// Split a raw permission argument. Malformed lines are logged and dropped.
    pub fn parse(argument: &str, default_currency: &str) -> Self {
        let mut lines = Vec::new();
        for raw in argument.lines() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let (currency, equation) = match raw.split_once(':') {
                Some((currency, equation)) => (currency.trim(), equation.trim()),
                None => (default_currency, raw),
            };
            if equation.is_empty() {
                warn!(
                    "Teleport cost line has no equation: {} (expected \"currency: equation\")",
                    escape_log(raw)
                );
                continue;
            }
            let currency = if currency.is_empty() {
                default_currency
            } else {
                currency
            };
            lines.push(CostLine {
                currency: currency.to_string(),
                equation: equation.to_string(),
            });
        }
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Evaluate every line, keeping the largest value per currency.
    ///
    /// Lines whose equation fails are logged and skipped; the rest still count.
    pub fn evaluate(&self, evaluator: &dyn EquationEvaluator, inputs: &TeleportInputs) -> CostLedger {
        let variables = inputs.variables();
        let mut ledger = CostLedger::new();
        for line in &self.lines {
            match evaluator.evaluate(&line.equation, &variables) {
                Ok(value) if value.is_finite() => ledger.raise_to(&line.currency, value),
                Ok(value) => warn!(
                    "Teleport cost for {} evaluated to {}, ignoring: {}",
                    line.currency,
                    value,
                    escape_log(&line.equation)
                ),
                Err(e) => warn!(
                    "Error evaluating teleport cost for {}: {}: {}",
                    line.currency,
                    escape_log(&line.equation),
                    e
                ),
            }
        }
        ledger
    }
}

/// Named inputs available to cost equations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TeleportInputs {
    pub distance: f64,
    pub across_worlds: bool,
}

impl TeleportInputs {
    /// With no origin (owner offline) both inputs are zero.
    pub fn between(origin: Option<&Location>, destination: &Location) -> Self {
        match origin {
            Some(origin) => Self {
                distance: origin.distance_to(destination),
                across_worlds: !origin.same_world_as(destination),
            },
            None => Self::default(),
        }
    }

    pub fn variables(&self) -> HashMap<&'static str, f64> {
        HashMap::from([
            (DISTANCE_VARIABLE, self.distance),
            (ACROSS_WORLDS_VARIABLE, if self.across_worlds { 1.0 } else { 0.0 }),
        ])
    }
}

pub struct CostCalculator {
    permissions: Arc<dyn PermissionService>,
    zones: Arc<dyn ZoneService>,
    equations: Arc<dyn EquationEvaluator>,
    default_currency: String,
    aggregation: CostAggregation,
}

impl CostCalculator {
    pub fn new(
        permissions: Arc<dyn PermissionService>,
        zones: Arc<dyn ZoneService>,
        equations: Arc<dyn EquationEvaluator>,
        default_currency: impl Into<String>,
        aggregation: CostAggregation,
    ) -> Self {
        Self {
            permissions,
            zones,
            equations,
            default_currency: default_currency.into(),
            aggregation,
        }
    }

    pub fn aggregation(&self) -> CostAggregation {
        self.aggregation
    }

    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    /// Scopes consulted for a teleport, origin scopes first.
    pub fn scopes(&self, origin: Option<&Location>, destination: &Location) -> Vec<CostScope> {
        let mut scopes = Vec::new();
        if let Some(origin) = origin {
            scopes.push(CostScope::FromWorld(origin.world_id.clone()));
            scopes.extend(self.zones.zones_containing(origin).into_iter().map(CostScope::FromZone));
        }
        scopes.push(CostScope::ToWorld(destination.world_id.clone()));
        scopes.extend(
            self.zones
                .zones_containing(destination)
                .into_iter()
                .map(CostScope::ToZone),
        );
        scopes
    }

    /// Cost of a teleport the player is actually requesting; every scope must be permitted.
    pub fn request_cost(
        &self,
        player: PlayerId,
        origin: Option<&Location>,
        destination: &Location,
    ) -> Result<CostLedger, HomeError> {
        self.compute(player, origin, destination, CostMode::Enforce)
    }

    /// Cost shown to a player asking what a teleport would cost; unpermitted scopes cost nothing.
    pub fn preview_cost(&self, player: PlayerId, origin: Option<&Location>, destination: &Location) -> CostLedger {
        let mut total = CostLedger::new();
        let inputs = TeleportInputs::between(origin, destination);
        for scope in self.scopes(origin, destination) {
            let status = self.permissions.status(player, &scope.permission_key());
            self.fold(&mut total, &self.scope_cost(&status, &inputs));
        }
        total
    }

    pub fn compute(
        &self,
        player: PlayerId,
        origin: Option<&Location>,
        destination: &Location,
        mode: CostMode,
    ) -> Result<CostLedger, HomeError> {
        if mode == CostMode::Preview {
            return Ok(self.preview_cost(player, origin, destination));
        }

        // Resolve every scope before evaluating anything, so a denial leaves no partial ledger.
        let statuses = self
            .scopes(origin, destination)
            .into_iter()
            .map(|scope| {
                let key = scope.permission_key();
                let status = self.permissions.status(player, &key);
                if status.granted {
                    Ok(status)
                } else {
                    Err(HomeError::MissingPermission {
                        player,
                        permission: key,
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let inputs = TeleportInputs::between(origin, destination);
        let mut total = CostLedger::new();
        for status in &statuses {
            self.fold(&mut total, &self.scope_cost(status, &inputs));
        }
        Ok(total)
    }

    /// Cost contributed by one scope's permission status.
    pub fn scope_cost(&self, status: &PermissionStatus, inputs: &TeleportInputs) -> CostLedger {
        match status.argument() {
            Some(argument) => PermissionScopeCost::parse(argument, &self.default_currency)
                .evaluate(self.equations.as_ref(), inputs),
            None => CostLedger::new(),
        }
    }

    fn fold(&self, total: &mut CostLedger, part: &CostLedger) {
        match self.aggregation {
            CostAggregation::Sum => total.sum_with(part),
            CostAggregation::Max => total.max_with(part),
        }
    }
}
