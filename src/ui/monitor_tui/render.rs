use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use super::app::MonitorApp;
use super::widgets::{colored_gauge, render_history, temp_color};
use crate::core::system_monitor::{GpuFidelity, MetricSnapshot, Reading, Series};
use crate::ui::formatters::{format_rate, format_size, format_timestamp, or_na, NOT_AVAILABLE};

/// Main render function
pub fn render_ui(frame: &mut Frame, app: &MonitorApp) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Header
            Constraint::Percentage(60), // CPU / GPU / Memory cards
            Constraint::Min(6),         // Disk + Network
            Constraint::Length(1),      // Footer
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    render_cards(frame, chunks[1], app);
    render_disk_network_section(frame, chunks[2], app);
    render_footer(frame, chunks[3]);

    // Render help overlay if active
    if app.show_help {
        render_help_overlay(frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let snapshot = &app.frame.snapshot;
    let gpu = &snapshot.gpu;

    let fidelity = match gpu.fidelity {
        GpuFidelity::Measured => "MEASURED",
        GpuFidelity::Estimated => "ESTIMATED",
    };

    let title = format!(
        " sysdash │ {} │ Refresh: {}ms │ GPU: {} [{}] ",
        format_timestamp(snapshot.timestamp),
        app.interval_ms,
        gpu.kind,
        fidelity
    );

    let border_color = match gpu.fidelity {
        GpuFidelity::Measured => Color::Cyan,
        GpuFidelity::Estimated => Color::Yellow,
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    frame.render_widget(block, area);
}

fn render_cards(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    render_cpu_card(frame, chunks[0], app);
    render_gpu_card(frame, chunks[1], app);
    render_memory_card(frame, chunks[2], app);
}

/// Split a card into gauge, detail lines and the history chart.
///
/// Returns `None` when the card is too small to hold anything.
fn card_layout(frame: &mut Frame, area: Rect, title: String, color: Color) -> Option<[Rect; 3]> {
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return None; // Not enough space
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Gauge
            Constraint::Length(3), // Details
            Constraint::Min(0),    // History
        ])
        .split(inner);

    Some([layout[0], layout[1], layout[2]])
}

/// Gauge for a reading's percentage, or a dimmed placeholder
fn render_usage<T>(
    frame: &mut Frame,
    area: Rect,
    reading: &Reading<T>,
    percent: impl FnOnce(&T) -> f32,
) {
    match reading.map(percent) {
        Some(value) => {
            let label = format!("{:.1}%", value);
            frame.render_widget(colored_gauge(value, &label), area);
        }
        None => render_unavailable(frame, area, reading),
    }
}

fn render_unavailable<T>(frame: &mut Frame, area: Rect, reading: &Reading<T>) {
    let text = match reading {
        Reading::Unavailable { reason } => format!("{} ({})", NOT_AVAILABLE, reason),
        Reading::Available(_) => NOT_AVAILABLE.to_string(),
    };
    let para = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(para, area);
}

fn render_cpu_card(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let cpu = &app.frame.snapshot.cpu;
    let Some([gauge, details, history]) =
        card_layout(frame, area, " CPU ".to_string(), Color::Cyan)
    else {
        return;
    };

    render_usage(frame, gauge, cpu, |c| c.usage_percent);

    let lines = match cpu.value() {
        Some(c) => {
            let cores = match c.physical_cores {
                Some(physical) => format!("{} cores / {} threads", physical, c.logical_cores),
                None => format!("{} threads", c.logical_cores),
            };
            let temp = match c.temperature_celsius {
                Some(t) => Span::styled(format!("{:.0}°C", t), Style::default().fg(temp_color(t))),
                None => Span::styled(NOT_AVAILABLE, Style::default().fg(Color::DarkGray)),
            };
            vec![
                Line::from(format!("Freq:  {} MHz", c.frequency_mhz)),
                Line::from(format!("Cores: {}", cores)),
                Line::from(vec![Span::raw("Temp:  "), temp]),
            ]
        }
        None => vec![],
    };
    frame.render_widget(Paragraph::new(lines), details);

    let data = app.frame.history.series_as_u64(Series::Cpu);
    render_history(frame, history, "History", &data, 1000, Color::Cyan);
}

fn render_gpu_card(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let gpu = &app.frame.snapshot.gpu;
    let reading = &gpu.reading;

    let (title, color) = match gpu.fidelity {
        GpuFidelity::Measured => (format!(" GPU · {} ", gpu.kind), Color::Magenta),
        GpuFidelity::Estimated => (format!(" GPU · {} · ESTIMATED ", gpu.kind), Color::Yellow),
    };

    let Some([gauge, details, history]) = card_layout(frame, area, title, color) else {
        return;
    };

    // Nothing sampled yet
    if app.frame.snapshot.timestamp == 0 {
        let para = Paragraph::new("Waiting for first sample...")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(para, gauge);
        return;
    }

    let label = format!("{:.1}%", reading.usage_percent);
    frame.render_widget(colored_gauge(reading.usage_percent, &label), gauge);

    let temp = match reading.temperature_celsius {
        Some(t) => Span::styled(format!("{:.0}°C", t), Style::default().fg(temp_color(t))),
        None => Span::styled(NOT_AVAILABLE, Style::default().fg(Color::DarkGray)),
    };
    let lines = vec![
        Line::from(format!(
            "VRAM:  {} / {}",
            format_size(reading.memory_used_bytes),
            format_size(reading.memory_total_bytes)
        )),
        Line::from(vec![Span::raw("Temp:  "), temp]),
        Line::from(format!("Procs: {}", reading.process_count)),
    ];
    frame.render_widget(Paragraph::new(lines), details);

    let data = app.frame.history.series_as_u64(Series::Gpu);
    render_history(frame, history, "History", &data, 1000, color);
}

fn render_memory_card(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let memory = &app.frame.snapshot.memory;
    let Some([gauge, details, history]) =
        card_layout(frame, area, " Memory ".to_string(), Color::Green)
    else {
        return;
    };

    render_usage(frame, gauge, memory, |m| m.usage_percent);

    let lines = vec![
        Line::from(format!(
            "Used:  {}",
            or_na(memory, |m| format!(
                "{} / {}",
                format_size(m.used_bytes),
                format_size(m.total_bytes)
            ))
        )),
        Line::from(format!(
            "Avail: {}",
            or_na(memory, |m| format_size(m.available_bytes))
        )),
    ];
    frame.render_widget(Paragraph::new(lines), details);

    let data = app.frame.history.series_as_u64(Series::Memory);
    render_history(frame, history, "History", &data, 1000, Color::Green);
}

fn render_disk_network_section(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    render_disk(frame, chunks[0], &app.frame.snapshot);
    render_network(frame, chunks[1], app);
}

fn render_disk(frame: &mut Frame, area: Rect, snapshot: &MetricSnapshot) {
    let disk = &snapshot.disk;
    let title = match disk.value() {
        Some(d) => format!(" Disk {} ", d.mount_point),
        None => " Disk ".to_string(),
    };

    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 2 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    render_usage(frame, layout[0], disk, |d| d.usage_percent);

    let lines = vec![
        Line::from(format!(
            "Used: {}",
            or_na(disk, |d| format!(
                "{} / {}",
                format_size(d.used_bytes),
                format_size(d.total_bytes)
            ))
        )),
        Line::from(format!("Free: {}", or_na(disk, |d| format_size(d.free_bytes)))),
    ];
    frame.render_widget(Paragraph::new(lines), layout[1]);
}

fn render_network(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let network = &app.frame.snapshot.network;

    let block = Block::default().title(" Network ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return; // No space to render
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let (upload, download) = match network.value() {
        Some(rates) => (
            format_rate(rates.upload_bytes_per_sec),
            format_rate(rates.download_bytes_per_sec),
        ),
        None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    };

    let rates = Line::from(vec![
        Span::styled("↑ ", Style::default().fg(Color::LightRed)),
        Span::raw(upload),
        Span::raw("   "),
        Span::styled("↓ ", Style::default().fg(Color::LightGreen)),
        Span::raw(download),
    ]);
    frame.render_widget(Paragraph::new(rates), layout[0]);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[1]);

    // Rates have no fixed ceiling, scale each chart to its own peak
    let history = &app.frame.history;
    let up = history.series_as_u64(Series::Upload);
    let down = history.series_as_u64(Series::Download);
    let up_max = up.iter().copied().max().unwrap_or(1);
    let down_max = down.iter().copied().max().unwrap_or(1);

    render_history(frame, charts[0], "Upload", &up, up_max, Color::LightRed);
    render_history(frame, charts[1], "Download", &down, down_max, Color::LightGreen);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let help = " q: Quit │ r: Restart GPU detection │ ?: Help ";
    let para = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(para, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_text = r#"
    sysdash - Help

    Keyboard Shortcuts:
    ─────────────────────────────────────
    q / Esc     Quit the application
    ? / h       Toggle this help screen
    r           Re-detect the GPU provider

    A yellow GPU card means no vendor tool
    answered: figures are estimated from the
    process list, not measured.

    Press any key to close this help
    "#;

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::DarkGray));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);

    // Center the help popup
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(paragraph, popup_area);
}

/// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
