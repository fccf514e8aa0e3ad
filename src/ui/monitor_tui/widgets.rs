use ratatui::{
    prelude::*,
    widgets::{BarChart, Block, Borders, Gauge},
};

/// Color for a 0-100 usage value
pub fn usage_color(value: f32) -> Color {
    match value {
        v if v < 50.0 => Color::Cyan,
        v if v < 75.0 => Color::LightYellow,
        v if v < 90.0 => Color::LightRed,
        _ => Color::Red,
    }
}

/// Create a gauge with color based on value thresholds
pub fn colored_gauge(value: f32, label: &str) -> Gauge<'_> {
    Gauge::default()
        .gauge_style(Style::default().fg(usage_color(value)).bg(Color::Black))
        .ratio(gauge_ratio(value))
        .label(label)
}

/// Gauge fill for a percentage; out-of-range input is clamped
pub fn gauge_ratio(percent: f32) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    (percent as f64 / 100.0).clamp(0.0, 1.0)
}

/// Get color for temperature value
pub fn temp_color(temp: f32) -> Color {
    match temp {
        t if t < 50.0 => Color::Cyan,
        t if t < 70.0 => Color::LightYellow,
        t if t < 85.0 => Color::LightRed,
        _ => Color::Red,
    }
}

/// Draw a rolling history as vertical bars, newest on the right.
///
/// `max` is the value that fills the full height.
pub fn render_history(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    history: &[u64],
    max: u64,
    color: Color,
) {
    if area.width <= 4 || area.height < 3 {
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let bar_width: u16 = 1;
    let bar_gap: u16 = 0;
    let space_per_bar = (bar_width + bar_gap) as usize;
    let max_bars = (inner_width / space_per_bar).min(history.len());

    // Take the most recent data points
    let start_idx = history.len().saturating_sub(max_bars);
    let data_to_show: Vec<(&str, u64)> = history[start_idx..]
        .iter()
        .map(|&val| ("", val))
        .collect();

    let chart = BarChart::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .direction(Direction::Vertical)
        .bar_width(bar_width)
        .bar_gap(bar_gap)
        .bar_style(Style::default().fg(color))
        .value_style(Style::default().fg(color).bg(color))
        .data(&data_to_show)
        .max(max.max(1));

    frame.render_widget(chart, area);
}
