//! Color themes. The three palettes mirror the hymnal's light, dark and
//! "space" looks, expressed as terminal colors.

use std::fmt;
use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeKey {
    #[default]
    Light,
    Dark,
    Space,
}

impl ThemeKey {
    pub const ALL: [ThemeKey; 3] = [ThemeKey::Light, ThemeKey::Dark, ThemeKey::Space];

    /// Identifier persisted in the preferences store.
    pub fn id(self) -> &'static str {
        match self {
            ThemeKey::Light => "light",
            ThemeKey::Dark => "dark",
            ThemeKey::Space => "space",
        }
    }

    /// Name shown to the user.
    pub fn name(self) -> &'static str {
        match self {
            ThemeKey::Light => "Claro",
            ThemeKey::Dark => "Oscuro",
            ThemeKey::Space => "Espacio",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ThemeKey::Light => ThemeKey::Dark,
            ThemeKey::Dark => ThemeKey::Space,
            ThemeKey::Space => ThemeKey::Light,
        }
    }

    pub fn theme(self) -> Theme {
        match self {
            ThemeKey::Light => Theme::light(),
            ThemeKey::Dark => Theme::dark(),
            ThemeKey::Space => Theme::space(),
        }
    }
}

impl FromStr for ThemeKey {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeKey::ALL
            .into_iter()
            .find(|key| key.id() == s.trim())
            .ok_or_else(|| UnknownTheme(s.to_string()))
    }
}

impl fmt::Display for ThemeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme `{0}`")]
pub struct UnknownTheme(pub String);

/// Palette used by every screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub background: Color,
    pub foreground: Color,
    /// Placeholder text in the search box and dimmed lines.
    pub placeholder: Color,
    /// Background of result rows.
    pub item: Color,
    /// Background of the selected result row.
    pub item_selected: Color,
    /// Lyric excerpts under search results.
    pub excerpt: Color,
    /// Section markers, key hints and the presentation cursor.
    pub accent: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    pub const fn light() -> Self {
        Self {
            background: Color::Rgb(250, 250, 249),
            foreground: Color::Rgb(28, 25, 23),
            placeholder: Color::Rgb(168, 162, 158),
            item: Color::Rgb(245, 245, 244),
            item_selected: Color::Rgb(214, 211, 209),
            excerpt: Color::Rgb(120, 113, 108),
            accent: Color::Rgb(87, 83, 78),
            error: Color::Rgb(185, 28, 28),
        }
    }

    pub const fn dark() -> Self {
        Self {
            background: Color::Rgb(28, 25, 23),
            foreground: Color::Rgb(250, 250, 249),
            placeholder: Color::Rgb(120, 113, 108),
            item: Color::Rgb(68, 64, 60),
            item_selected: Color::Rgb(120, 113, 108),
            excerpt: Color::Rgb(168, 162, 158),
            accent: Color::Rgb(214, 211, 209),
            error: Color::Rgb(248, 113, 113),
        }
    }

    pub const fn space() -> Self {
        Self {
            background: Color::Rgb(46, 16, 101),
            foreground: Color::White,
            placeholder: Color::Rgb(167, 139, 250),
            item: Color::Rgb(109, 40, 217),
            item_selected: Color::Rgb(139, 92, 246),
            excerpt: Color::Rgb(237, 233, 254),
            accent: Color::Rgb(196, 181, 253),
            error: Color::Rgb(252, 165, 165),
        }
    }

    pub fn base_style(&self) -> Style {
        Style::default().bg(self.background).fg(self.foreground)
    }

    pub fn item_style(&self, selected: bool) -> Style {
        let bg = if selected {
            self.item_selected
        } else {
            self.item
        };
        Style::default().bg(bg).fg(self.foreground)
    }

    pub fn placeholder_style(&self) -> Style {
        Style::default().fg(self.placeholder)
    }

    pub fn excerpt_style(&self) -> Style {
        Style::default()
            .fg(self.excerpt)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn marker_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn key_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    /// The line currently on screen in presentation mode.
    pub fn current_line_style(&self) -> Style {
        Style::default()
            .fg(self.foreground)
            .add_modifier(Modifier::BOLD)
    }

    /// Lines around the current one in presentation mode.
    pub fn dimmed_style(&self) -> Style {
        Style::default().fg(self.placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for key in ThemeKey::ALL {
            assert_eq!(key.id().parse::<ThemeKey>(), Ok(key));
        }
        assert!("sepia".parse::<ThemeKey>().is_err());
    }

    #[test]
    fn next_cycles_through_every_theme() {
        let mut key = ThemeKey::Light;
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(key);
            key = key.next();
        }
        assert_eq!(seen, ThemeKey::ALL);
        assert_eq!(key, ThemeKey::Light);
    }
}
