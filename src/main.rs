//! Binary entry point: resolve settings, open the preference store, start the
//! catalog download and drive the Ratatui event loop until the user exits.
use anyhow::Context;
use clap::Parser;
use hymnal::db::{load_theme, open_in_memory, open_store};
use hymnal::{logging, run_app, spawn_catalog_loader, App, Cli, Settings};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    let settings = Settings::from_cli(Cli::parse()).context("invalid configuration")?;

    if let Err(err) = logging::init(&settings.data_dir) {
        eprintln!("logging disabled: {err:#}");
    }
    info!(catalog = %settings.catalog, route = %settings.route.path(), "starting");

    let conn = match open_store(&settings.data_dir) {
        Ok(conn) => conn,
        Err(err) => {
            warn!("preferences will not persist: {err:#}");
            open_in_memory()?
        }
    };
    let theme = load_theme(&conn)?;

    let catalog = spawn_catalog_loader(settings.catalog.clone());
    let mut app = App::new(conn, &settings, theme);
    run_app(&mut app, catalog)
}
