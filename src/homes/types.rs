use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a player across sessions.
pub type PlayerId = Uuid;

/// Name of a zone as reported by the zone service.
pub type ZoneId = String;

/// Name used for a player's default home.
pub const DEFAULT_HOME_NAME: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Straight-line distance, ignoring which world either point is in.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub pitch: f64,
    pub yaw: f64,
}

impl Orientation {
    pub fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }
}

/// A point in a specific world, with the direction an entity standing there faces.
///
/// The world id is never validated here: a location may outlive the world it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world_id: String,
    pub position: Position,
    pub orientation: Orientation,
}

impl Location {
    pub fn new(world_id: impl Into<String>, x: f64, y: f64, z: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            world_id: world_id.into(),
            position: Position::new(x, y, z),
            orientation: Orientation::new(pitch, yaw),
        }
    }

    pub fn distance_to(&self, other: &Location) -> f64 {
        self.position.distance_to(&other.position)
    }

    pub fn same_world_as(&self, other: &Location) -> bool {
        self.world_id == other.world_id
    }
}

/// A named home. Replaced wholesale when the player sets the same name again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeEntry {
    pub owner: PlayerId,
    pub name: String,
    pub location: Location,
}

impl HomeEntry {
    pub fn new(owner: PlayerId, name: impl Into<String>, location: Location) -> Self {
        Self {
            owner,
            name: name.into(),
            location,
        }
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_HOME_NAME
    }

    /// Name suitable for showing to players; the default home has an empty name.
    pub fn display_name(&self) -> &str {
        if self.is_default() {
            "(default)"
        } else {
            &self.name
        }
    }
}

/// All homes belonging to one player, keyed by home name.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerHomeRecord {
    owner: PlayerId,
    homes: BTreeMap<String, HomeEntry>,
}

impl PlayerHomeRecord {
    pub fn new(owner: PlayerId) -> Self {
        Self {
            owner,
            homes: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn is_empty(&self) -> bool {
        self.homes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.homes.len()
    }

    pub fn get(&self, name: &str) -> Option<&HomeEntry> {
        self.homes.get(name)
    }

    /// Home names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.homes.keys().cloned().collect()
    }

    pub fn homes(&self) -> impl Iterator<Item = &HomeEntry> {
        self.homes.values()
    }

    pub fn count_in_world(&self, world_id: &str) -> usize {
        self.homes
            .values()
            .filter(|home| home.location.world_id == world_id)
            .count()
    }

    /// Insert or replace a home, returning the entry it replaced.
    pub fn insert(&mut self, name: impl Into<String>, location: Location) -> Option<HomeEntry> {
        let name = name.into();
        let entry = HomeEntry::new(self.owner, name.clone(), location);
        self.homes.insert(name, entry)
    }

    pub fn remove(&mut self, name: &str) -> Option<HomeEntry> {
        self.homes.remove(name)
    }

    /// Remove every home, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let removed = self.homes.len();
        self.homes.clear();
        removed
    }
}

/// Per-currency amounts for one cost computation. Amounts are never negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostLedger {
    amounts: BTreeMap<String, f64>,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn get(&self, currency: &str) -> Option<f64> {
        self.amounts.get(currency).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.amounts.iter().map(|(currency, amount)| (currency.as_str(), *amount))
    }

    /// Add to the running amount for a currency.
    pub fn add(&mut self, currency: &str, amount: f64) {
        *self.amounts.entry(currency.to_string()).or_insert(0.0) += amount.max(0.0);
    }

    /// Keep whichever of the stored and offered amounts is larger.
    pub fn raise_to(&mut self, currency: &str, amount: f64) {
        let amount = amount.max(0.0);
        self.amounts
            .entry(currency.to_string())
            .and_modify(|current| *current = current.max(amount))
            .or_insert(amount);
    }

    /// Fold another ledger in by summing matching currencies.
    pub fn sum_with(&mut self, other: &CostLedger) {
        for (currency, amount) in other.iter() {
            self.add(currency, amount);
        }
    }

    /// Fold another ledger in by keeping the larger amount per currency.
    pub fn max_with(&mut self, other: &CostLedger) {
        for (currency, amount) in other.iter() {
            self.raise_to(currency, amount);
        }
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for CostLedger {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut ledger = CostLedger::new();
        for (currency, amount) in iter {
            let currency: String = currency.into();
            ledger.add(&currency, amount);
        }
        ledger
    }
}

impl fmt::Display for CostLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.amounts.is_empty() {
            return write!(f, "nothing");
        }
        let parts: Vec<String> = self
            .amounts
            .iter()
            .map(|(currency, amount)| format!("{} {}", amount, currency))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_sum_and_max_fold_per_currency() {
        let a: CostLedger = [("gold", 10.0), ("xp", 2.0)].into_iter().collect();
        let b: CostLedger = [("gold", 4.0), ("gems", 1.0)].into_iter().collect();

        let mut summed = a.clone();
        summed.sum_with(&b);
        assert_eq!(summed.get("gold"), Some(14.0));
        assert_eq!(summed.get("gems"), Some(1.0));

        let mut maxed = a;
        maxed.max_with(&b);
        assert_eq!(maxed.get("gold"), Some(10.0));
        assert_eq!(maxed.get("xp"), Some(2.0));
    }

    #[test]
    fn ledger_never_goes_negative() {
        let mut ledger = CostLedger::new();
        ledger.add("gold", -5.0);
        ledger.raise_to("xp", -1.0);
        assert_eq!(ledger.get("gold"), Some(0.0));
        assert_eq!(ledger.get("xp"), Some(0.0));
    }

    #[test]
    fn record_counts_homes_per_world() {
        let owner = Uuid::new_v4();
        let mut record = PlayerHomeRecord::new(owner);
        record.insert("a", Location::new("overworld", 0.0, 64.0, 0.0, 0.0, 0.0));
        record.insert("b", Location::new("overworld", 10.0, 64.0, 0.0, 0.0, 0.0));
        record.insert("c", Location::new("nether", 0.0, 32.0, 0.0, 0.0, 0.0));

        assert_eq!(record.count_in_world("overworld"), 2);
        assert_eq!(record.count_in_world("nether"), 1);
        assert_eq!(record.names(), vec!["a", "b", "c"]);
    }
}
