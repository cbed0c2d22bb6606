//! Test utilities & fixtures.
//! Builds a `HomesService` over the in-memory host, with its homes file in a temp dir.
#![allow(dead_code)]

use homebound::config::Config;
use homebound::homes::memory::MemoryHost;
use homebound::homes::{permissions, HomesService, Location, PlayerId};
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub config: Config,
    pub host: MemoryHost,
    pub homes: HomesService,
}

impl Fixture {
    /// A second service over the same files and host, as after a restart.
    pub fn reopen(&self) -> HomesService {
        HomesService::new(&self.config, self.host.services())
    }
}

pub fn fixture() -> Fixture {
    fixture_with(|_| {})
}

/// Worlds `overworld` and `nether` are loaded; no zones, no grants, no money.
pub fn fixture_with(configure: impl FnOnce(&mut Config)) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.homes.data_dir = dir.path().join("data").to_string_lossy().into_owned();
    configure(&mut config);

    let host = MemoryHost::new();
    host.worlds.add_world("overworld");
    host.worlds.add_world("nether");
    let homes = HomesService::new(&config, host.services());
    Fixture {
        dir,
        config,
        host,
        homes,
    }
}

pub fn at(world: &str, x: f64, y: f64, z: f64) -> Location {
    Location::new(world, x, y, z, 0.0, 0.0)
}

/// Let the player add homes: server permission with `server_cap`, and every listed
/// world with no cap.
pub fn allow_homes(host: &MemoryHost, player: PlayerId, server_cap: Option<&str>, worlds: &[&str]) {
    match server_cap {
        Some(cap) => host
            .permissions
            .grant_with_arg(player, permissions::PERMISSION_HOMES_ADD, cap),
        None => host.permissions.grant(player, permissions::PERMISSION_HOMES_ADD),
    }
    for world in worlds {
        host.permissions.grant(player, permissions::add_in_world(world));
    }
}

/// Allow teleporting out of and into `world` for free.
pub fn allow_travel(host: &MemoryHost, player: PlayerId, world: &str) {
    host.permissions.grant(player, permissions::tp_from_world(world));
    host.permissions.grant(player, permissions::tp_to_world(world));
}
