//! # Homebound - named player homes for multi-world game servers
//!
//! Players register named home locations and teleport back to them. How many homes a
//! player may hold, server-wide, per world and per zone, and what each teleport costs
//! are both driven by permission arguments supplied by the host game.
//!
//! ## Features
//!
//! - **Home registry**: per-player records with snapshot reads and per-player locking.
//! - **Caps**: server, world and zone caps, checked atomically with the insert.
//! - **Teleport costs**: `currency: equation` permission arguments evaluated over the
//!   origin and destination scopes, in any number of currencies.
//! - **Teleports**: permission, cost, all-or-nothing charge, then move, with a refund if
//!   the move still fails.
//! - **Persistence**: a flat CSV file with a backup of the previous save.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use homebound::config::Config;
//! use homebound::homes::memory::MemoryHost;
//! use homebound::homes::HomesService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("homebound.toml").await?;
//!     let host = MemoryHost::new();
//!     let homes = HomesService::new(&config, host.services());
//!     homes.load()?;
//!     println!("{} players have homes", homes.players_with_homes().len());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`homes`] - registry, caps, costs, teleports and the homes file
//! - [`config`] - configuration loading and validation
//! - [`logutil`] - single-line escaping for logged user text

pub mod config;
pub mod homes;
pub mod logutil;
