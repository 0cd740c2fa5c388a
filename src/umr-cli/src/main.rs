mod commands;
mod config;
mod menu;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use config::Config;
use umr::{GameDirs, Swapper};

#[derive(Parser)]
#[command(name = "umr")]
#[command(about = "Uma Musume model swapper", long_about = None)]
struct Cli {
    /// Game data directory (default: auto-detect, or the configured path)
    #[arg(long, env = "UMR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory for backups and texture exports
    #[arg(long, env = "UMR_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Asset files are enciphered (newer installs)
    #[arg(long)]
    encrypted: bool,

    /// Persist --data-dir/--work-dir/--encrypted to the config file and
    /// exit
    #[arg(long)]
    save_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;

    if cli.save_config {
        if cli.data_dir.is_some() {
            config.data_dir = cli.data_dir.clone();
        }
        if cli.work_dir.is_some() {
            config.work_dir = cli.work_dir.clone();
        }
        if cli.encrypted {
            config.encrypted = Some(true);
        }
        config.save()?;
        println!("Configuration saved to {}", Config::config_path()?.display());
        return Ok(());
    }

    let game = resolve_game_dirs(&cli, &config)?;
    let work_dir = match cli.work_dir.or_else(|| config.work_dir.clone()) {
        Some(dir) => dir,
        None => Config::default_work_dir()?,
    };
    let encrypted = cli.encrypted || config.encrypted.unwrap_or(false);

    println!("Game data: {}", game.root().display());
    println!("Work dir:  {}", work_dir.display());

    let mut swapper = Swapper::new(game, &work_dir, encrypted)
        .context("Failed to open the game databases")?;

    menu::run(&mut swapper)
}

fn resolve_game_dirs(cli: &Cli, config: &Config) -> Result<GameDirs> {
    if let Some(dir) = cli.data_dir.clone().or_else(|| config.data_dir.clone()) {
        return Ok(GameDirs::new(dir));
    }

    GameDirs::detect().context(
        "Game data directory not found. Pass --data-dir or run \
         'umr --data-dir PATH --save-config' once to remember it.",
    )
}
