use crossterm::event::KeyCode;

/// Events that can occur in the monitor TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Quit the application
    Quit,
    /// Toggle help overlay
    ToggleHelp,
    /// Re-detect the GPU provider
    RestartGpu,
    /// No action
    None,
}

pub fn map_key(code: KeyCode) -> MonitorEvent {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => MonitorEvent::Quit,
        KeyCode::Char('?') | KeyCode::Char('h') => MonitorEvent::ToggleHelp,
        KeyCode::Char('r') => MonitorEvent::RestartGpu,
        _ => MonitorEvent::None,
    }
}
