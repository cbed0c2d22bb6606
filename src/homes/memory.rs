//! In-memory host services.
//!
//! Thread-safe stand-ins for the permission, currency, zone and world services. Tests use
//! them to script a host, and the CLI uses them to evaluate cost arguments offline.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use crate::homes::equation::BuiltinEvaluator;
use crate::homes::errors::HomeError;
use crate::homes::ports::{
    CurrencyService, HostServices, PermissionService, PermissionStatus, WorldService, ZoneService,
};
use crate::homes::types::{CostLedger, Location, Orientation, PlayerId, Position, ZoneId};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Permission grants, per player or for everyone. A per-player grant wins over an
/// everyone grant of the same key.
#[derive(Default)]
pub struct PermissionTable {
    players: RwLock<HashMap<(PlayerId, String), Option<String>>>,
    everyone: RwLock<HashMap<String, Option<String>>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, player: PlayerId, permission: impl Into<String>) {
        write(&self.players).insert((player, permission.into()), None);
    }

    pub fn grant_with_arg(&self, player: PlayerId, permission: impl Into<String>, argument: impl Into<String>) {
        write(&self.players).insert((player, permission.into()), Some(argument.into()));
    }

    pub fn grant_everyone(&self, permission: impl Into<String>, argument: Option<String>) {
        write(&self.everyone).insert(permission.into(), argument);
    }

    pub fn revoke(&self, player: PlayerId, permission: &str) {
        write(&self.players).remove(&(player, permission.to_string()));
    }
}

impl PermissionService for PermissionTable {
    fn status(&self, player: PlayerId, permission: &str) -> PermissionStatus {
        if let Some(argument) = read(&self.players).get(&(player, permission.to_string())) {
            return PermissionStatus::granted(permission, argument.clone());
        }
        match read(&self.everyone).get(permission) {
            Some(argument) => PermissionStatus::granted(permission, argument.clone()),
            None => PermissionStatus::denied(permission),
        }
    }
}

/// Multi-currency balances. Charges are checked and applied under one write lock.
#[derive(Default)]
pub struct Bank {
    currencies: RwLock<HashSet<String>>,
    balances: RwLock<HashMap<PlayerId, HashMap<String, f64>>>,
}

impl Bank {
    pub fn new<I, S>(currencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            currencies: RwLock::new(currencies.into_iter().map(Into::into).collect()),
            balances: RwLock::new(HashMap::new()),
        }
    }

    pub fn deposit(&self, player: PlayerId, currency: &str, amount: f64) {
        write(&self.currencies).insert(currency.to_string());
        *write(&self.balances)
            .entry(player)
            .or_default()
            .entry(currency.to_string())
            .or_insert(0.0) += amount;
    }

    pub fn balance(&self, player: PlayerId, currency: &str) -> f64 {
        read(&self.balances)
            .get(&player)
            .and_then(|wallet| wallet.get(currency))
            .copied()
            .unwrap_or(0.0)
    }

    fn check_currencies(&self, ledger: &CostLedger) -> Result<(), HomeError> {
        let known = read(&self.currencies);
        match ledger.iter().find(|(currency, _)| !known.contains(*currency)) {
            Some((currency, _)) => Err(HomeError::UnrecognisedCurrency(currency.to_string())),
            None => Ok(()),
        }
    }
}

impl CurrencyService for Bank {
    fn charge(&self, player: PlayerId, ledger: &CostLedger) -> Result<bool, HomeError> {
        self.check_currencies(ledger)?;

        let mut balances = write(&self.balances);
        let wallet = balances.entry(player).or_default();
        let affordable = ledger
            .iter()
            .all(|(currency, amount)| wallet.get(currency).copied().unwrap_or(0.0) >= amount);
        if !affordable {
            debug!("{} cannot afford {}", player, ledger);
            return Ok(false);
        }
        for (currency, amount) in ledger.iter() {
            *wallet.entry(currency.to_string()).or_insert(0.0) -= amount;
        }
        Ok(true)
    }

    fn refund(&self, player: PlayerId, ledger: &CostLedger) -> Result<(), HomeError> {
        self.check_currencies(ledger)?;
        let mut balances = write(&self.balances);
        let wallet = balances.entry(player).or_default();
        for (currency, amount) in ledger.iter() {
            *wallet.entry(currency.to_string()).or_insert(0.0) += amount;
        }
        Ok(())
    }
}

/// An axis-aligned box zone. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxZone {
    pub name: ZoneId,
    pub world_id: String,
    pub min: Position,
    pub max: Position,
}

impl BoxZone {
    pub fn new(name: impl Into<ZoneId>, world_id: impl Into<String>, corner_a: Position, corner_b: Position) -> Self {
        Self {
            name: name.into(),
            world_id: world_id.into(),
            min: Position::new(
                corner_a.x.min(corner_b.x),
                corner_a.y.min(corner_b.y),
                corner_a.z.min(corner_b.z),
            ),
            max: Position::new(
                corner_a.x.max(corner_b.x),
                corner_a.y.max(corner_b.y),
                corner_a.z.max(corner_b.z),
            ),
        }
    }

    pub fn contains(&self, location: &Location) -> bool {
        let p = &location.position;
        location.world_id == self.world_id
            && (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }
}

/// Zones reported in the order they were added.
#[derive(Default)]
pub struct BoxZones {
    zones: RwLock<Vec<BoxZone>>,
}

impl BoxZones {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, zone: BoxZone) {
        write(&self.zones).push(zone);
    }
}

impl ZoneService for BoxZones {
    fn zones_containing(&self, location: &Location) -> Vec<ZoneId> {
        read(&self.zones)
            .iter()
            .filter(|zone| zone.contains(location))
            .map(|zone| zone.name.clone())
            .collect()
    }
}

/// Loaded worlds and online players.
#[derive(Default)]
pub struct WorldTable {
    worlds: RwLock<HashSet<String>>,
    players: RwLock<HashMap<PlayerId, Location>>,
    fail_moves: AtomicBool,
}

impl WorldTable {
    pub fn new<I, S>(worlds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            worlds: RwLock::new(worlds.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn add_world(&self, world_id: impl Into<String>) {
        write(&self.worlds).insert(world_id.into());
    }

    pub fn remove_world(&self, world_id: &str) {
        write(&self.worlds).remove(world_id);
    }

    pub fn place(&self, player: PlayerId, location: Location) {
        write(&self.players).insert(player, location);
    }

    pub fn log_off(&self, player: PlayerId) {
        write(&self.players).remove(&player);
    }

    /// Make every subsequent move fail until switched off again.
    pub fn set_fail_moves(&self, fail: bool) {
        self.fail_moves.store(fail, Ordering::SeqCst);
    }
}

impl WorldService for WorldTable {
    fn world_exists(&self, world_id: &str) -> bool {
        read(&self.worlds).contains(world_id)
    }

    fn player_location(&self, player: PlayerId) -> Option<Location> {
        read(&self.players).get(&player).cloned()
    }

    fn move_entity(
        &self,
        player: PlayerId,
        world_id: &str,
        position: Position,
        orientation: Orientation,
    ) -> Result<(), String> {
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(format!("host refused to move {}", player));
        }
        if !self.world_exists(world_id) {
            return Err(format!("world {} is not loaded", world_id));
        }
        let mut players = write(&self.players);
        let Some(current) = players.get_mut(&player) else {
            return Err(format!("player {} is not online", player));
        };
        *current = Location {
            world_id: world_id.to_string(),
            position,
            orientation,
        };
        Ok(())
    }
}

/// A complete in-memory host, with typed handles kept for scripting.
#[derive(Clone)]
pub struct MemoryHost {
    pub permissions: Arc<PermissionTable>,
    pub bank: Arc<Bank>,
    pub zones: Arc<BoxZones>,
    pub worlds: Arc<WorldTable>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            permissions: Arc::new(PermissionTable::new()),
            bank: Arc::new(Bank::default()),
            zones: Arc::new(BoxZones::new()),
            worlds: Arc::new(WorldTable::default()),
        }
    }

    pub fn services(&self) -> HostServices {
        HostServices {
            permissions: self.permissions.clone(),
            currency: self.bank.clone(),
            zones: self.zones.clone(),
            worlds: self.worlds.clone(),
            equations: Arc::new(BuiltinEvaluator),
        }
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}
