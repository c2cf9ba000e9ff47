//! Pad grid with per-voice mixer levels

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use drumpad::{engine::MAX_LEVEL, Engine, Voice};

use super::{keymap::PAD_KEYS, View};

/// Render the ten pads side by side, each with its key and level gauge
pub fn render_pads(frame: &mut Frame, area: Rect, engine: &Engine, view: &View) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, Voice::COUNT as u32); Voice::COUNT])
        .split(area);

    for (index, voice) in Voice::ALL.into_iter().enumerate() {
        let column = columns[index];
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(4), Constraint::Length(3)])
            .split(column);

        let border = if voice == view.selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let face = if view.lit[index] {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        let pad = Paragraph::new(vec![
            Line::from(format!("[{}]", PAD_KEYS[index])),
            Line::from(voice.name()),
        ])
        .style(face)
        .centered()
        .block(Block::default().borders(Borders::ALL).border_style(border));
        frame.render_widget(pad, rows[0]);

        let level = engine.voice_level(voice);
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_style(border))
            .gauge_style(Style::default().fg(Color::Green))
            .ratio((level / MAX_LEVEL).clamp(0.0, 1.0) as f64)
            .label(format!("{level:.2}"));
        frame.render_widget(gauge, rows[1]);
    }
}
