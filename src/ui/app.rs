use std::mem;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::catalog::{Catalog, CatalogError, SongSelection};
use crate::config::Settings;
use crate::db::save_theme;
use crate::lyrics;
use crate::models::Song;
use crate::presentation::{Direction, Navigator};
use crate::route::Route;
use crate::search::SearchEngine;
use crate::theme::{Theme, ThemeKey};

use super::helpers::{centered_rect, surface_error, wrap_song};
use super::screens::{SearchScreen, SongScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const SEARCH_BAR_HEIGHT: u16 = 3;
/// One step of the loader animation.
const LOADER_FRAME: Duration = Duration::from_millis(300);
/// Rows moved by PageUp/PageDown outside presentation mode.
const PAGE_ROWS: i32 = 10;
const PLACEHOLDER: &str = "Buscar por título, número o letra...";
const SCROLL_HINT: &str = "Desplázate o pulsa ↓ para avanzar";

enum Screen {
    Loading { since: Instant },
    Search,
    Song(SongScreen),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self, theme: &Theme) -> Style {
        match self {
            StatusKind::Info => theme.key_style(),
            StatusKind::Error => theme.error_style(),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    catalog: Catalog,
    engine: SearchEngine,
    search: SearchScreen,
    navigator: Navigator,
    screen: Screen,
    theme: ThemeKey,
    status: Option<StatusMessage>,
    /// Route requested at startup, resolved once the catalog arrives.
    pending_route: Route,
}

impl App {
    pub fn new(conn: Connection, settings: &Settings, theme: ThemeKey) -> Self {
        Self {
            conn,
            catalog: Catalog::default(),
            engine: SearchEngine::new(settings.search),
            search: SearchScreen::new(settings.debounce),
            navigator: Navigator::new(),
            screen: Screen::Loading {
                since: Instant::now(),
            },
            theme,
            status: None,
            pending_route: settings.route.clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.screen, Screen::Loading { .. })
    }

    /// Install the catalog delivered by the loader thread. A failed load leaves
    /// the app usable with an empty catalog and an error in the footer.
    pub fn finish_loading(&mut self, result: Result<Catalog, CatalogError>) {
        self.screen = Screen::Search;
        match result {
            Ok(catalog) => {
                info!(songs = catalog.len(), "catalog ready");
                self.catalog = catalog;
                let route = mem::take(&mut self.pending_route);
                self.open_route(&route);
            }
            Err(err) => {
                let err = anyhow::Error::new(err);
                error!("failed to load catalog: {err:#}");
                self.catalog = Catalog::default();
                self.set_status(
                    format!("No se pudo cargar el himnario: {}", surface_error(&err)),
                    StatusKind::Error,
                );
            }
        }
    }

    /// Advance time-driven state. Returns whether a redraw is warranted.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.screen {
            Screen::Search => self.search.tick(now),
            Screen::Loading { .. } => true,
            Screen::Song(_) => false,
        }
    }

    /// How long the event loop may sleep before `tick` has something to do.
    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        match self.screen {
            Screen::Loading { .. } => Some(LOADER_FRAME),
            Screen::Search => self
                .search
                .deadline()
                .map(|deadline| deadline.saturating_duration_since(now)),
            Screen::Song(_) => None,
        }
    }

    /// Dispatch a key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return true,
                KeyCode::Char('t') => self.cycle_theme(),
                _ => {}
            }
            return false;
        }

        match self.screen {
            Screen::Loading { .. } => matches!(key.code, KeyCode::Esc | KeyCode::Char('q')),
            Screen::Search => self.handle_search_key(key.code, now),
            Screen::Song(_) => self.handle_song_key(key.code),
        }
    }

    /// Mouse wheel, in rows. Positive scrolls down.
    pub fn handle_scroll(&mut self, delta: i32) {
        match self.screen {
            Screen::Song(_) => self.navigator.scroll_by(delta),
            Screen::Search => self.move_selection(delta.signum() as isize),
            Screen::Loading { .. } => {}
        }
    }

    fn handle_search_key(&mut self, code: KeyCode, now: Instant) -> bool {
        match code {
            KeyCode::Esc => {
                if self.search.query.is_empty() {
                    return true;
                }
                self.search.clear(now);
            }
            KeyCode::Enter => self.open_selected(),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-(PAGE_ROWS as isize)),
            KeyCode::PageDown => self.move_selection(PAGE_ROWS as isize),
            KeyCode::Backspace => self.search.backspace(now),
            KeyCode::Char(ch) => self.search.push_char(ch, now),
            _ => {}
        }
        false
    }

    fn handle_song_key(&mut self, code: KeyCode) -> bool {
        let presenting = matches!(&self.screen, Screen::Song(song) if song.presenting);
        if presenting && self.handle_presentation_key(code) {
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Esc if presenting => self.toggle_presentation(),
            KeyCode::Esc | KeyCode::Backspace => self.back_to_search(),
            KeyCode::Char('p') => self.toggle_presentation(),
            KeyCode::Up | KeyCode::Char('k') => self.navigator.scroll_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.navigator.scroll_by(1),
            KeyCode::PageUp => self.navigator.scroll_by(-PAGE_ROWS),
            KeyCode::PageDown => self.navigator.scroll_by(PAGE_ROWS),
            KeyCode::Home => self.navigator.reset(),
            _ => {}
        }
        false
    }

    /// Navigation keys in presentation mode drive the line cursor instead of
    /// scrolling. Returns whether the key was consumed.
    fn handle_presentation_key(&mut self, code: KeyCode) -> bool {
        let direction = match code {
            KeyCode::Down
            | KeyCode::Right
            | KeyCode::PageDown
            | KeyCode::Char(' ')
            | KeyCode::Char('j') => Direction::Forward,
            KeyCode::Up | KeyCode::Left | KeyCode::PageUp | KeyCode::Char('k') => {
                Direction::Backward
            }
            _ => return false,
        };
        self.navigator.advance(direction);
        true
    }

    fn move_selection(&mut self, offset: isize) {
        let len = self.engine.search(&self.catalog, &self.search.settled).len();
        self.search.move_selection(offset, len);
    }

    /// Open the highlighted hit. A query still waiting out its quiet period is
    /// settled first so the hit comes from what the user actually typed.
    fn open_selected(&mut self) {
        self.search.flush();
        let song = self
            .engine
            .search(&self.catalog, &self.search.settled)
            .get(self.search.selected)
            .map(|hit| hit.song.clone());
        if let Some(song) = song {
            self.open_song(song);
        }
    }

    fn open_route(&mut self, route: &Route) {
        let outcome = match self.catalog.resolve(route) {
            SongSelection::None => return,
            SongSelection::Found(song) => Ok(song.clone()),
            SongSelection::NotFound(segment) => Err(segment),
        };
        match outcome {
            Ok(song) => self.open_song(song),
            Err(segment) => {
                warn!(%segment, "route names no song in the catalog");
                self.set_status(
                    format!("No existe el himno {segment}."),
                    StatusKind::Error,
                );
            }
        }
    }

    fn open_song(&mut self, song: Song) {
        info!(%song, route = %Route::song(song.number).path(), "opening song");
        self.navigator.load(lyrics::flatten(&song, false));
        self.screen = Screen::Song(SongScreen::new(song));
        self.clear_status();
    }

    fn back_to_search(&mut self) {
        self.navigator.load(Vec::new());
        self.screen = Screen::Search;
        self.clear_status();
    }

    fn toggle_presentation(&mut self) {
        if let Screen::Song(screen) = &mut self.screen {
            screen.presenting = !screen.presenting;
            self.navigator
                .load(lyrics::flatten(&screen.song, screen.presenting));
        }
    }

    fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        match save_theme(&self.conn, self.theme) {
            Ok(()) => self.set_status(format!("Tema: {}", self.theme.name()), StatusKind::Info),
            Err(err) => {
                warn!("failed to save theme: {err:#}");
                self.set_status(
                    format!("No se pudo guardar el tema: {}", surface_error(&err)),
                    StatusKind::Error,
                );
            }
        }
    }

    /// Render the whole frame. Takes `&mut self` because the song view reports
    /// its layout back to the navigator.
    pub(crate) fn draw(&mut self, frame: &mut Frame) {
        let theme = self.theme.theme();
        let area = frame.area();
        frame.render_widget(Block::default().style(theme.base_style()), area);

        let footer_height = FOOTER_HEIGHT.min(area.height);
        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(LayoutDirection::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match self.screen {
            Screen::Loading { since } => self.draw_loader(frame, content_area, since, &theme),
            Screen::Search => self.draw_search(frame, content_area, &theme),
            Screen::Song(_) => self.draw_song(frame, content_area, &theme),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area, &theme);
        }
    }

    fn draw_loader(&self, frame: &mut Frame, area: Rect, since: Instant, theme: &Theme) {
        let step = since.elapsed().as_millis() / LOADER_FRAME.as_millis();
        let dots = ".".repeat((step % 4) as usize);
        let popup = centered_rect(40, 20, area);
        let paragraph = Paragraph::new(Line::from(Span::styled(
            format!("Cargando{dots:<3}"),
            theme.marker_style(),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).style(theme.base_style()));
        frame.render_widget(paragraph, popup);
    }

    fn draw_search(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([Constraint::Length(SEARCH_BAR_HEIGHT), Constraint::Min(0)])
            .split(area);

        let input_block = Block::default()
            .borders(Borders::ALL)
            .title(" Himnario ")
            .border_style(theme.placeholder_style());
        let input = if self.search.query.is_empty() {
            Line::from(Span::styled(PLACEHOLDER, theme.placeholder_style()))
        } else {
            Line::from(self.search.query.clone())
        };
        frame.render_widget(Paragraph::new(input).block(input_block.clone()), chunks[0]);

        let inner = input_block.inner(chunks[0]);
        let typed = u16::try_from(self.search.query.chars().count()).unwrap_or(u16::MAX);
        let cursor_x = inner
            .x
            .saturating_add(typed)
            .min(inner.right().saturating_sub(1));
        frame.set_cursor_position((cursor_x, inner.y));

        let settled = self.search.settled.trim().to_string();
        let selected = self.search.selected;
        let catalog_empty = self.catalog.is_empty();
        let hits = self.engine.search(&self.catalog, &settled);

        let notice = if catalog_empty {
            Some("El himnario no está disponible.".to_string())
        } else if settled.is_empty() {
            Some("Escribe para buscar un himno.".to_string())
        } else if hits.is_empty() {
            Some(format!("Sin resultados para \"{settled}\"."))
        } else {
            None
        };
        if let Some(notice) = notice {
            let paragraph = Paragraph::new(Span::styled(notice, theme.placeholder_style()))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, chunks[1]);
            return;
        }

        let items: Vec<ListItem> = hits
            .iter()
            .map(|hit| {
                let mut lines = vec![Line::from(Span::styled(
                    hit.song.display_title(),
                    Style::default().add_modifier(Modifier::BOLD),
                ))];
                lines.extend(hit.highlights.iter().map(|excerpt| {
                    Line::from(Span::styled(format!("  {excerpt}"), theme.excerpt_style()))
                }));
                ListItem::new(lines).style(theme.item_style(false))
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(selected.min(hits.len().saturating_sub(1))));
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .title(format!(" {} resultados ", hits.len())),
            )
            .highlight_style(theme.item_style(true))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_song(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let Screen::Song(screen) = &self.screen else {
            return;
        };
        let presenting = screen.presenting;
        let title = if presenting {
            format!(" {} · Presentación ", screen.song.display_title())
        } else {
            format!(" {} ", screen.song.display_title())
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(theme.placeholder_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.navigator.total_lines() == 0 {
            let paragraph = Paragraph::new(Span::styled(
                "Este himno no tiene letra.",
                theme.placeholder_style(),
            ))
            .alignment(Alignment::Center);
            frame.render_widget(paragraph, inner);
            return;
        }

        let show_hint = presenting && !self.navigator.hint_dismissed() && inner.height > 1;
        let (text_area, hint_area) = if show_hint {
            let chunks = Layout::default()
                .direction(LayoutDirection::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(1)])
                .split(inner);
            (chunks[0], Some(chunks[1]))
        } else {
            (inner, None)
        };

        let wrapped = wrap_song(self.navigator.lines(), text_area.width);
        let current = self.navigator.current_line();
        let mut rows = Vec::new();
        let numbered = self.navigator.lines().iter().zip(&wrapped.rows).enumerate();
        for (idx, (line, line_rows)) in numbered {
            if idx > 0 && line.is_marker() {
                rows.push(Line::from(""));
            }
            let style = match (presenting, line.is_marker()) {
                (true, _) if idx == current => theme.current_line_style(),
                (true, _) => theme.dimmed_style(),
                (false, true) => theme.marker_style(),
                (false, false) => theme.base_style(),
            };
            rows.extend(
                line_rows
                    .iter()
                    .map(|row| Line::from(Span::styled(row.clone(), style))),
            );
        }

        self.navigator.set_viewport(wrapped.layout, text_area.height);
        let alignment = if presenting {
            Alignment::Center
        } else {
            Alignment::Left
        };
        let paragraph = Paragraph::new(rows)
            .alignment(alignment)
            .scroll((self.navigator.scroll_offset(), 0));
        frame.render_widget(paragraph, text_area);

        if let Some(hint_area) = hint_area {
            let hint = Paragraph::new(Span::styled(SCROLL_HINT, theme.placeholder_style()))
                .alignment(Alignment::Center);
            frame.render_widget(hint, hint_area);
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(theme.placeholder_style());
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style(theme))])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions(theme);

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self, theme: &Theme) -> Line<'static> {
        let key_style = theme.key_style();
        let theme_keys = [
            Span::styled("[Ctrl+T]", key_style),
            Span::raw(format!(" Tema ({})", self.theme.name())),
        ];
        let mut spans = match &self.screen {
            Screen::Loading { .. } => vec![Span::styled("[Esc]", key_style), Span::raw(" Salir")],
            Screen::Search => vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navegar   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Abrir   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Limpiar/Salir   "),
            ],
            Screen::Song(song) if song.presenting => vec![
                Span::styled("[↓/Espacio]", key_style),
                Span::raw(" Siguiente   "),
                Span::styled("[↑]", key_style),
                Span::raw(" Anterior   "),
                Span::styled("[Home]", key_style),
                Span::raw(" Inicio   "),
                Span::styled("[p/Esc]", key_style),
                Span::raw(" Lectura   "),
            ],
            Screen::Song(_) => vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Desplazar   "),
                Span::styled("[p]", key_style),
                Span::raw(" Presentar   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Volver   "),
                Span::styled("[q]", key_style),
                Span::raw(" Salir   "),
            ],
        };
        if !self.is_loading() {
            spans.extend(theme_keys);
        }
        Line::from(spans)
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::{Section, SectionType};
    use crate::search::SearchOptions;
    use std::path::PathBuf;

    fn settings(route: Route) -> Settings {
        Settings {
            catalog: crate::catalog::CatalogSource::File(PathBuf::from("unused.json")),
            search: SearchOptions::default(),
            debounce: Duration::from_millis(400),
            route,
            data_dir: PathBuf::from("."),
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![Song {
            number: 101,
            title: "Santo, Santo, Santo".into(),
            sections: vec![
                Section {
                    section_type: SectionType::Verse,
                    sort_index: 1,
                    content: "Santo, santo, santo\nSeñor omnipotente".into(),
                },
                Section {
                    section_type: SectionType::Chorus,
                    sort_index: 2,
                    content: "Gloria a Dios".into(),
                },
            ],
        }])
    }

    fn app(route: Route) -> App {
        let conn = open_in_memory().unwrap();
        App::new(conn, &settings(route), ThemeKey::default())
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn startup_route_opens_the_song_once_loaded() {
        let mut app = app(Route::song(101));
        assert!(app.is_loading());
        app.finish_loading(Ok(catalog()));
        assert!(matches!(&app.screen, Screen::Song(song) if song.song.number == 101));
        assert_eq!(app.navigator.total_lines(), 5);
    }

    #[test]
    fn unknown_route_reports_not_found() {
        let mut app = app(Route::Song("999".into()));
        app.finish_loading(Ok(catalog()));
        assert!(matches!(app.screen, Screen::Search));
        let status = app.status.as_ref().unwrap();
        assert!(status.text.contains("999"));
    }

    #[test]
    fn typed_query_opens_the_first_hit() {
        let mut app = app(Route::Home);
        app.finish_loading(Ok(catalog()));
        let start = Instant::now();
        for ch in "santo".chars() {
            app.handle_key(press(KeyCode::Char(ch)), start);
        }
        app.tick(start + Duration::from_millis(500));
        app.handle_key(press(KeyCode::Enter), start);
        assert!(matches!(app.screen, Screen::Song(_)));

        app.handle_key(press(KeyCode::Esc), start);
        assert!(matches!(app.screen, Screen::Search));
        assert_eq!(app.search.query, "santo");
    }

    #[test]
    fn enter_during_the_quiet_period_uses_the_latest_query() {
        let mut app = app(Route::Home);
        app.finish_loading(Ok(catalog()));
        let start = Instant::now();
        for ch in "santo".chars() {
            app.handle_key(press(KeyCode::Char(ch)), start);
        }
        app.tick(start + Duration::from_millis(500));
        assert_eq!(app.search.settled, "santo");

        let typed = start + Duration::from_millis(600);
        for ch in "zzzz".chars() {
            app.handle_key(press(KeyCode::Char(ch)), typed);
        }
        app.handle_key(press(KeyCode::Enter), start + Duration::from_millis(650));

        assert!(matches!(app.screen, Screen::Search));
        assert_eq!(app.search.settled, "santozzzz");
        assert_eq!(app.next_wakeup(start + Duration::from_millis(650)), None);
        assert!(!app.tick(start + Duration::from_millis(1100)));
    }

    #[test]
    fn nothing_settles_while_a_song_is_open() {
        let mut app = app(Route::Home);
        app.finish_loading(Ok(catalog()));
        let start = Instant::now();
        for ch in "santo".chars() {
            app.handle_key(press(KeyCode::Char(ch)), start);
        }
        app.handle_key(press(KeyCode::Enter), start + Duration::from_millis(100));
        assert!(matches!(app.screen, Screen::Song(_)));
        assert_eq!(app.search.settled, "santo");

        assert_eq!(app.next_wakeup(start + Duration::from_millis(200)), None);
        assert!(!app.tick(start + Duration::from_secs(1)));
    }

    #[test]
    fn presentation_keys_move_the_cursor_and_reset_on_toggle() {
        let mut app = app(Route::song(101));
        app.finish_loading(Ok(catalog()));
        let now = Instant::now();
        app.handle_key(press(KeyCode::Char('p')), now);
        assert_eq!(app.navigator.current_line(), 0);

        app.handle_key(press(KeyCode::Down), now);
        assert_eq!(app.navigator.current_line(), 1);
        assert!(app.navigator.hint_dismissed());

        app.handle_key(press(KeyCode::Char('p')), now);
        assert_eq!(app.navigator.current_line(), 0);
        assert!(app.navigator.hint_dismissed());
    }

    #[test]
    fn failed_load_keeps_the_app_running() {
        let mut app = app(Route::Home);
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        app.finish_loading(Err(CatalogError::Parse(err)));
        assert!(!app.is_loading());
        assert!(app.catalog.is_empty());
        assert!(matches!(app.status, Some(StatusMessage { kind: StatusKind::Error, .. })));
    }

    #[test]
    fn escape_on_empty_query_quits() {
        let mut app = app(Route::Home);
        app.finish_loading(Ok(catalog()));
        assert!(app.handle_key(press(KeyCode::Esc), Instant::now()));
        assert!(app.handle_key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Instant::now()
        ));
    }
}
