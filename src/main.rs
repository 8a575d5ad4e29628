//! Binary entry point: load settings, open the catalog, and drive the Ratatui
//! event loop until the user exits.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use bangla_gan::{
    init_logging, open_catalog, run_app, App, Config, Navigator, Route, SongRepository,
    SongViewModel,
};

#[derive(Parser)]
#[command(name = "bangla-gan")]
#[command(about = "Browse, search and bookmark Bengali songs in the terminal")]
#[command(version)]
struct Cli {
    /// Config file path (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog database to open instead of the configured one
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Screen to start on, e.g. `favorites` or `songs_by_category/genre/বাউল`
    #[arg(short, long, default_value = "home")]
    route: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    init_logging(&config.log_path, cli.verbose)?;
    config.log_notices();

    let start = Route::parse(&cli.route)
        .with_context(|| format!("invalid start route '{}'", cli.route))?;
    info!("Starting at {start}");

    let store = open_catalog(&config.database_path)?;
    let repo = SongRepository::from_store(store, config.seed_on_create)?;
    let vm = SongViewModel::new(repo, config.search_debounce());

    let mut app = App::new(vm, Navigator::starting_at(start));
    let result = run_app(&mut app);
    if let Err(err) = &result {
        error!("Exited with error: {err:#}");
    }
    result
}
