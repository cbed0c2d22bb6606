//! Binary entrypoint for the Homebound CLI.
//!
//! Commands:
//! - `init` - write a starter `homebound.toml` and create the data directory
//! - `status` - read the homes file and print a summary
//! - `list [--player <uuid>] [--json]` - print stored homes
//! - `delete --player <uuid> [--home <name>]` - delete one home, or all of a player's homes
//! - `cost-check --argument <text> [--distance <d>] [--across-worlds]` - evaluate a
//!   teleport cost permission argument
//!
//! See the library crate docs for module-level details: `homebound::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use uuid::Uuid;

use homebound::config::Config;
use homebound::homes::memory::MemoryHost;
use homebound::homes::{BuiltinEvaluator, HomeEntry, HomesService, PermissionScopeCost, TeleportInputs};

#[derive(Parser)]
#[command(name = "homebound")]
#[command(about = "Named player homes and teleport costs for multi-world game servers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "homebound.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Show how many players and homes are stored
    Status,
    /// List stored homes
    List {
        /// Only this player's homes
        #[arg(short, long)]
        player: Option<Uuid>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Delete a home, or every home of a player, and save
    Delete {
        #[arg(short, long)]
        player: Uuid,
        /// Home to delete; omit to delete all of the player's homes
        #[arg(long)]
        home: Option<String>,
        /// Save even if malformed rows were skipped (they are dropped from the file)
        #[arg(long)]
        force: bool,
    },
    /// Evaluate a teleport cost permission argument
    CostCheck {
        /// Newline-separated `currency: equation` lines
        #[arg(short, long)]
        argument: String,
        #[arg(short, long, default_value_t = 0.0)]
        distance: f64,
        #[arg(long)]
        across_worlds: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            info!("Initializing new Homebound configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);

            let config = Config::default();
            tokio::fs::create_dir_all(&config.homes.data_dir)
                .await
                .map_err(|e| anyhow!("Failed to create data directory {}: {}", config.homes.data_dir, e))?;
            info!("Homes will be stored in {}", config.homes.save_path().display());
        }
        Commands::Status => {
            let config = require_config(pre_config, &cli.config).await?;
            let homes = open_homes(&config);
            let summary = homes.load()?;
            println!("Homes file:   {}", homes.store().path().display());
            println!("Backup file:  {}", homes.store().backup_path().display());
            println!("Players:      {}", summary.players);
            println!("Homes:        {}", summary.homes);
            println!("Skipped rows: {}", summary.skipped);
            println!(
                "Costs:        default currency {}, {:?} across scopes",
                homes.costs().default_currency(),
                homes.costs().aggregation()
            );
        }
        Commands::List { player, json } => {
            let config = require_config(pre_config, &cli.config).await?;
            let homes = open_homes(&config);
            homes.load()?;
            let players = match player {
                Some(player) => vec![player],
                None => homes.players_with_homes(),
            };
            let entries: Vec<HomeEntry> = players
                .into_iter()
                .flat_map(|player| homes.list_homes(player))
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No homes.");
            } else {
                for home in &entries {
                    let at = &home.location;
                    println!(
                        "{}  {:<16} {} ({:.1}, {:.1}, {:.1})",
                        home.owner,
                        home.display_name(),
                        at.world_id,
                        at.position.x,
                        at.position.y,
                        at.position.z
                    );
                }
            }
        }
        Commands::Delete { player, home, force } => {
            let config = require_config(pre_config, &cli.config).await?;
            let homes = open_homes(&config);
            let summary = homes.load()?;
            if !summary.is_complete() {
                if !force {
                    return Err(anyhow!(
                        "{} malformed rows in {} would be lost on save; fix them or pass --force",
                        summary.skipped,
                        homes.store().path().display()
                    ));
                }
                warn!(
                    "Dropping {} malformed rows from {} (previous file kept at {})",
                    summary.skipped,
                    homes.store().path().display(),
                    homes.store().backup_path().display()
                );
            }
            match home {
                Some(name) => {
                    let removed = homes.delete_home(player, &name)?;
                    println!("Deleted home {} of {}", removed.display_name(), player);
                }
                None => {
                    let count = homes.clear_homes(player);
                    println!("Deleted {} homes of {}", count, player);
                }
            }
            homes.save()?;
        }
        Commands::CostCheck {
            argument,
            distance,
            across_worlds,
        } => {
            let config = pre_config.unwrap_or_default();
            let parsed = PermissionScopeCost::parse(&argument, &config.costs.default_currency);
            if parsed.is_empty() {
                println!("No cost lines.");
                return Ok(());
            }
            for line in &parsed.lines {
                println!("{}: {}", line.currency, line.equation);
            }
            let inputs = TeleportInputs {
                distance,
                across_worlds,
            };
            let ledger = parsed.evaluate(&BuiltinEvaluator, &inputs);
            println!("Cost: {}", ledger);
        }
    }

    Ok(())
}

async fn require_config(pre_config: Option<Config>, path: &str) -> Result<Config> {
    match pre_config {
        Some(config) => Ok(config),
        None => Config::load(path).await,
    }
}

/// The CLI works on the homes file alone, so host services are in-memory and empty.
fn open_homes(config: &Config) -> HomesService {
    HomesService::new(config, MemoryHost::new().services())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|cfg| cfg.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    match log_file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Mirror to the console only in the foreground
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
