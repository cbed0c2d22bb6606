use crate::config::Config;
use crate::homes::capacity::CapacityEnforcer;
use crate::homes::cost::CostCalculator;
use crate::homes::errors::HomeError;
use crate::homes::ports::HostServices;
use crate::homes::registry::HomeRegistry;
use crate::homes::storage::{HomeStore, LoadReport};
use crate::homes::teleport::{TeleportReceipt, TeleportRequest, TeleportTransaction};
use crate::homes::types::{CostLedger, HomeEntry, Location, PlayerId};

/// Summary of a load, for the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub players: usize,
    pub homes: usize,
    pub skipped: usize,
}

impl LoadSummary {
    /// False when malformed rows were left out; saving now would drop them from the
    /// primary file.
    pub fn is_complete(&self) -> bool {
        self.skipped == 0
    }
}

/// The operations the command layer calls.
///
/// Owns the registry and the homes file. Host services are shared with the cost and
/// capacity components.
pub struct HomesService {
    registry: HomeRegistry,
    store: HomeStore,
    services: HostServices,
    capacity: CapacityEnforcer,
    costs: CostCalculator,
}

impl HomesService {
    pub fn new(config: &Config, services: HostServices) -> Self {
        let store = HomeStore::new(config.homes.save_path(), config.homes.backup_path());
        let capacity = CapacityEnforcer::new(
            services.permissions.clone(),
            services.zones.clone(),
            config.capacity.overwrite_policy,
        );
        let costs = CostCalculator::new(
            services.permissions.clone(),
            services.zones.clone(),
            services.equations.clone(),
            config.costs.default_currency.clone(),
            config.costs.aggregation,
        );
        Self {
            registry: HomeRegistry::new(),
            store,
            services,
            capacity,
            costs,
        }
    }

    pub fn registry(&self) -> &HomeRegistry {
        &self.registry
    }

    pub fn store(&self) -> &HomeStore {
        &self.store
    }

    pub fn costs(&self) -> &CostCalculator {
        &self.costs
    }

    pub fn list_home_names(&self, player: PlayerId) -> Vec<String> {
        self.registry
            .get_if_present(player)
            .map(|record| record.names())
            .unwrap_or_default()
    }

    pub fn list_homes(&self, player: PlayerId) -> Vec<HomeEntry> {
        self.registry
            .get_if_present(player)
            .map(|record| record.homes().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_home(&self, player: PlayerId, name: &str) -> Result<HomeEntry, HomeError> {
        self.registry
            .get_home(player, name)
            .ok_or_else(|| HomeError::NotFound {
                player,
                home: name.to_string(),
            })
    }

    pub fn players_with_homes(&self) -> Vec<PlayerId> {
        self.registry.players_with_homes()
    }

    /// Create or overwrite a home with no permission or cap checks.
    pub fn set_home(&self, player: PlayerId, name: &str, location: Location) -> Option<HomeEntry> {
        self.registry
            .with_record_mut(player, |record| record.insert(name, location))
    }

    /// Create or overwrite a home, subject to the player's permissions and caps.
    ///
    /// Returns the home that was replaced, if any.
    pub fn request_set_home(
        &self,
        player: PlayerId,
        name: &str,
        location: Location,
    ) -> Result<Option<HomeEntry>, HomeError> {
        let caps = self.capacity.caps_for(player, &location)?;
        let capacity = &self.capacity;
        self.registry
            .with_record_mut(player, |record| -> Result<Option<HomeEntry>, HomeError> {
                capacity.check(record, name, &location, &caps)?;
                Ok(record.insert(name, location))
            })
    }

    fn current_location(&self, player: PlayerId) -> Result<Location, HomeError> {
        self.services
            .worlds
            .player_location(player)
            .ok_or(HomeError::PlayerOffline(player))
    }

    pub fn set_home_here(&self, player: PlayerId, name: &str) -> Result<Option<HomeEntry>, HomeError> {
        let location = self.current_location(player)?;
        Ok(self.set_home(player, name, location))
    }

    pub fn request_set_home_here(&self, player: PlayerId, name: &str) -> Result<Option<HomeEntry>, HomeError> {
        let location = self.current_location(player)?;
        self.request_set_home(player, name, location)
    }

    pub fn delete_home(&self, player: PlayerId, name: &str) -> Result<HomeEntry, HomeError> {
        if !self.registry.has(player) {
            return Err(HomeError::PlayerNotFound(player));
        }
        self.registry
            .with_record_mut(player, |record| record.remove(name))
            .ok_or_else(|| HomeError::NotFound {
                player,
                home: name.to_string(),
            })
    }

    /// Delete every home the player has, returning how many there were.
    pub fn clear_homes(&self, player: PlayerId) -> usize {
        if !self.registry.has(player) {
            return 0;
        }
        self.registry.with_record_mut(player, |record| record.clear())
    }

    /// What teleporting the owner to one of their homes would cost, ignoring scopes
    /// they lack permission for.
    pub fn preview_teleport_cost(&self, player: PlayerId, name: &str) -> Result<CostLedger, HomeError> {
        let home = self.get_home(player, name)?;
        let origin = self.services.worlds.player_location(player);
        Ok(self.costs.preview_cost(player, origin.as_ref(), &home.location))
    }

    /// What teleporting the owner to one of their homes costs, requiring every scope
    /// permission.
    pub fn request_teleport_cost(&self, player: PlayerId, name: &str) -> Result<CostLedger, HomeError> {
        let home = self.get_home(player, name)?;
        let origin = self.services.worlds.player_location(player);
        self.costs.request_cost(player, origin.as_ref(), &home.location)
    }

    fn teleport(&self, request: TeleportRequest) -> Result<TeleportReceipt, HomeError> {
        TeleportTransaction::new(&self.registry, &self.services, &self.costs, request).execute()
    }

    pub fn teleport_home(&self, player: PlayerId, name: &str) -> Result<TeleportReceipt, HomeError> {
        self.teleport(TeleportRequest::Own {
            player,
            home: name.to_string(),
        })
    }

    pub fn teleport_to_home_of(
        &self,
        actor: PlayerId,
        owner: PlayerId,
        name: &str,
    ) -> Result<TeleportReceipt, HomeError> {
        self.teleport(TeleportRequest::ToHomeOf {
            actor,
            owner,
            home: name.to_string(),
        })
    }

    pub fn teleport_other_to_home_of(
        &self,
        actor: PlayerId,
        traveller: PlayerId,
        owner: PlayerId,
        name: &str,
    ) -> Result<TeleportReceipt, HomeError> {
        self.teleport(TeleportRequest::OtherToHomeOf {
            actor,
            traveller,
            owner,
            home: name.to_string(),
        })
    }

    /// Write a snapshot of the registry to the homes file.
    pub fn save(&self) -> Result<usize, HomeError> {
        self.store.save(&self.registry.list_all())
    }

    /// Replace the registry with the contents of the homes file.
    pub fn load(&self) -> Result<LoadSummary, HomeError> {
        let LoadReport { homes, skipped, .. } = self.store.load()?;
        self.registry.replace_all(homes);
        Ok(LoadSummary {
            players: self.registry.players_with_homes().len(),
            homes: self.registry.home_count(),
            skipped,
        })
    }
}
