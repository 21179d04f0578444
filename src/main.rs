//! Binary entrypoint for the Castaway CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and the island catalog JSON
//! - `play --player <id> [--name <name>]` - line-oriented console session
//! - `status --player <id>` - print one player's status
//! - `players` - list stored player ids
//! - `thresholds [--levels <n>]` - experience needed per level
//! - `delete --player <id>` - remove a player's record
//!
//! See the library crate docs for module-level details: `castaway::`.
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use castaway::config::Config;
use castaway::game::{
    canonical_seed, describe_error, handle_command, threshold_table, CommandSession,
    ContentCatalog, GameCommand, GameStore, MutationCoordinator,
};

#[derive(Parser)]
#[command(name = "castaway")]
#[command(about = "An island survival text adventure")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and island catalog
    Init,
    /// Play from this terminal as the given player
    Play {
        /// Player identifier
        #[arg(short, long)]
        player: String,
        /// Display name used by START
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Show a player's status
    Status {
        #[arg(short, long)]
        player: String,
    },
    /// List stored players
    Players,
    /// Print the experience threshold table
    Thresholds {
        #[arg(short, long, default_value_t = 10)]
        levels: u32,
    },
    /// Delete a player's record
    Delete {
        #[arg(short, long)]
        player: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        return init(&cli.config).await;
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);

    // Catalog problems are fatal at startup.
    let catalog = ContentCatalog::load_from_json(&config.game.catalog_path).map_err(|e| {
        error!("failed to load catalog {}: {}", config.game.catalog_path, e);
        anyhow!(e)
    })?;

    if let Commands::Thresholds { levels } = cli.command {
        for (level, needed) in threshold_table(levels, &catalog.tuning.progression) {
            println!("Level {:>2}: {} xp", level, needed);
        }
        return Ok(());
    }

    let store = Arc::new(GameStore::open(&config.game.db_path)?);
    let coordinator = MutationCoordinator::new(store, Arc::new(catalog))
        .with_mutation_timeout(config.game.mutation_timeout());

    match cli.command {
        Commands::Play { player, name } => {
            let session = CommandSession {
                display_name: name.unwrap_or_else(|| config.game.starting_name.clone()),
                context: config.game.action_context(&player),
                player_id: player,
            };
            play(&coordinator, &session).await?;
        }
        Commands::Status { player } => {
            let session = CommandSession {
                display_name: config.game.starting_name.clone(),
                context: config.game.action_context(&player),
                player_id: player,
            };
            for line in handle_command(&coordinator, &session, GameCommand::Status).await {
                println!("{}", line);
            }
        }
        Commands::Players => {
            let mut ids = coordinator.list_players()?;
            ids.sort();
            for id in ids {
                println!("{}", id);
            }
        }
        Commands::Delete { player } => {
            let mut ctx = config.game.action_context(&player);
            ctx.operator = true;
            match coordinator.delete_player(&player, &ctx).await {
                Ok(true) => println!("Deleted player {}", player),
                Ok(false) => println!("No player {}", player),
                Err(e) => println!("{}", describe_error(&e)),
            }
        }
        Commands::Init | Commands::Thresholds { .. } => {}
    }

    Ok(())
}

async fn init(config_path: &str) -> Result<()> {
    info!("Initializing new Castaway configuration");
    let cfg = Config::default();
    let serialized = toml::to_string_pretty(&cfg)?;
    tokio::fs::write(config_path, serialized).await?;
    info!("Configuration file created at {}", config_path);

    let catalog_path = Path::new(&cfg.game.catalog_path);
    if let Some(parent) = catalog_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let seed = serde_json::to_string_pretty(&canonical_seed())?;
    tokio::fs::write(catalog_path, seed).await?;
    info!("Island catalog written to {}", catalog_path.display());
    Ok(())
}

async fn play(
    coordinator: &MutationCoordinator<GameStore>,
    session: &CommandSession,
) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout
        .write_all(b"Castaway. Type START to begin or HELP for commands.\n> ")
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let command = GameCommand::parse(&line);
        let quit = command == GameCommand::Quit;
        for out in handle_command(coordinator, session, command).await {
            stdout.write_all(out.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        if quit {
            break;
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }
    stdout.flush().await?;
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
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

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when attached to a terminal
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
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
