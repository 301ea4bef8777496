use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, warn};

use crate::catalog::{Catalog, CatalogError, CatalogSource};

use super::app::App;

/// Upper bound on how long the loop blocks waiting for input.
const IDLE_POLL: Duration = Duration::from_millis(250);
/// Rows per mouse wheel notch.
const WHEEL_ROWS: i32 = 3;

type CatalogResult = Result<Catalog, CatalogError>;

/// Load the catalog off the UI thread. The result arrives exactly once on the
/// returned channel.
pub fn spawn_catalog_loader(source: CatalogSource) -> Receiver<CatalogResult> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = Catalog::load(&source);
        if tx.send(result).is_err() {
            debug!("catalog arrived after the UI exited");
        }
    });
    rx
}

/// Spin up the terminal backend, enter the draw loop, and keep processing input
/// until the user quits. The terminal is restored even if the loop fails.
pub fn run_app(app: &mut App, catalog: Receiver<CatalogResult>) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    if let Err(err) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        let _ = disable_raw_mode();
        return Err(err).context("failed to enter alternate screen");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(terminal) => terminal,
        Err(err) => {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            return Err(err).context("failed to create terminal backend");
        }
    };

    let result = event_loop(&mut terminal, app, &catalog);
    let restored = cleanup_terminal(&mut terminal);
    result.and(restored)
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    catalog: &Receiver<CatalogResult>,
) -> Result<()> {
    loop {
        if app.is_loading() {
            match catalog.try_recv() {
                Ok(result) => app.finish_loading(result),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    warn!("catalog loader exited without a result");
                    app.finish_loading(Ok(Catalog::default()));
                }
            }
        }
        app.tick(Instant::now());

        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        let timeout = app
            .next_wakeup(Instant::now())
            .map_or(IDLE_POLL, |wait| wait.min(IDLE_POLL));
        if !event::poll(timeout).context("event polling failed")? {
            continue;
        }

        match event::read().context("failed to read event")? {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                if app.handle_key(key_event, Instant::now()) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollDown => app.handle_scroll(WHEEL_ROWS),
                MouseEventKind::ScrollUp => app.handle_scroll(-WHEEL_ROWS),
                _ => {}
            },
            _ => {}
        }
    }
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("failed to leave alternate screen")?;
    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")
}
