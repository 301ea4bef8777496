//! Core library surface for the hymnal viewer.
//!
//! Everything the terminal front-end needs lives in plain modules so the search
//! engine, line sequencer and presentation navigator can be exercised without
//! a terminal.
pub mod catalog;
pub mod config;
pub mod db;
pub mod debounce;
pub mod logging;
pub mod lyrics;
pub mod models;
pub mod presentation;
pub mod route;
pub mod search;
pub mod theme;
pub mod ui;

pub use catalog::{Catalog, CatalogError, CatalogSource, SongSelection};
pub use config::{Cli, Settings};
pub use models::{Section, SectionType, Song};
pub use route::Route;
pub use search::{search, SearchEngine, SearchHit, SearchOptions};

/// The interactive application entry point and state container.
pub use ui::{run_app, spawn_catalog_loader, App};
