//! Ratatui front-end: a search screen, a song view and its presentation mode.

mod app;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::{run_app, spawn_catalog_loader};
