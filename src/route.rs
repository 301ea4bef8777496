//! Path-style addressing for songs (`/songs/101`), kept as an explicit value
//! that gets resolved against the catalog once it has loaded.

use tracing::warn;

const SONGS_PREFIX: &str = "songs/";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    /// The search screen.
    #[default]
    Home,
    /// A song addressed by its number, as written in the path.
    Song(String),
}

impl Route {
    /// Parse `/`, `/songs/<number>` or a bare `<number>`. Anything else falls
    /// back to the search screen.
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Route::Home;
        }

        let segment = trimmed.strip_prefix(SONGS_PREFIX).unwrap_or(trimmed);
        if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
            Route::Song(segment.to_string())
        } else {
            warn!(path, "unrecognised route, showing the search screen");
            Route::Home
        }
    }

    pub fn song(number: i64) -> Self {
        Route::Song(number.to_string())
    }

    /// Canonical path form, mirroring what `parse` accepts.
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Song(segment) => format!("/{SONGS_PREFIX}{segment}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_song_paths() {
        assert_eq!(Route::parse("/songs/101"), Route::Song("101".into()));
        assert_eq!(Route::parse("songs/7/"), Route::Song("7".into()));
        assert_eq!(Route::parse("42"), Route::Song("42".into()));
    }

    #[test]
    fn anything_else_is_home() {
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse("/songs/"), Route::Home);
        assert_eq!(Route::parse("/albums/3"), Route::Home);
    }

    #[test]
    fn path_matches_parse() {
        let route = Route::song(230);
        assert_eq!(route.path(), "/songs/230");
        assert_eq!(Route::parse(&route.path()), route);
    }
}
