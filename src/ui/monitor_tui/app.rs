use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::core::config::Config;
use crate::core::system_monitor::{Frame, MonitorRuntime, SnapshotReader};

use super::event_handler::{map_key, MonitorEvent};
use super::render::render_ui;

/// Upper bound on how long a key press waits to be handled
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Monitor application state
pub struct MonitorApp {
    pub frame: Arc<Frame>,
    reader: SnapshotReader,
    pub should_quit: bool,
    pub show_help: bool,
    pub interval_ms: u64,
    pub gpu_restart_requested: bool,
}

impl MonitorApp {
    pub fn new(reader: SnapshotReader, interval_ms: u64) -> Self {
        Self {
            frame: reader.frame(),
            reader,
            should_quit: false,
            show_help: false,
            interval_ms,
            gpu_restart_requested: false,
        }
    }

    /// Pick up the latest frame. True if it differs from the one shown.
    pub fn refresh(&mut self) -> bool {
        if !self.reader.has_changed() {
            return false;
        }
        self.frame = self.reader.mark_seen();
        true
    }

    /// Handle keyboard events
    pub fn handle_event(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::Quit => self.should_quit = true,
            MonitorEvent::ToggleHelp => self.show_help = !self.show_help,
            MonitorEvent::RestartGpu => self.gpu_restart_requested = true,
            MonitorEvent::None => {}
        }
    }

    /// Take a pending GPU restart request, clearing it.
    pub fn take_gpu_restart(&mut self) -> bool {
        std::mem::take(&mut self.gpu_restart_requested)
    }
}

/// Run the monitor TUI application
pub fn run_monitor_app(config: &Config) -> Result<()> {
    // Start sampling before touching the terminal so a failure leaves it intact
    let runtime = MonitorRuntime::start(config).context("Failed to start sampler")?;

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = MonitorApp::new(runtime.reader(), config.interval().as_millis() as u64);
    let result = event_loop(&mut terminal, &mut app, &runtime);

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    runtime.shutdown();
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut MonitorApp,
    runtime: &MonitorRuntime,
) -> Result<()> {
    let mut needs_redraw = true;

    loop {
        if app.refresh() {
            needs_redraw = true;
        }

        if needs_redraw {
            terminal.draw(|frame| render_ui(frame, app))?;
            needs_redraw = false;
        }

        if event::poll(INPUT_POLL).context("Event poll failed")? {
            match event::read().context("Event read failed")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Any key closes the help overlay
                    let monitor_event = if app.show_help {
                        MonitorEvent::ToggleHelp
                    } else {
                        map_key(key.code)
                    };
                    app.handle_event(monitor_event);
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }

        if app.take_gpu_restart() && !runtime.restart_gpu() {
            log::warn!("Sampler is not running; GPU restart ignored");
        }

        // Check if should quit
        if app.should_quit {
            return Ok(());
        }
    }
}
