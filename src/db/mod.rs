//! Persistence for the one thing the viewer remembers between runs: the
//! selected theme.

mod connection;
mod preferences;

pub use connection::{ensure_schema, open_in_memory, open_store};
pub use preferences::{fetch_preference, load_theme, save_theme, store_preference};
