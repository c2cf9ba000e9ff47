//! Status bar widget - kit, tempo, metronome, recorder, master and latency

use std::time::Duration;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use drumpad::{recorder::RecorderState, Engine};

use super::View;

/// Render the status bar
pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    engine: &Engine,
    view: &View,
    elapsed: Option<Duration>,
) {
    let block = Block::default().title(" drumpad ").borders(Borders::ALL);

    let beat = if view.beat { "●" } else { "○" };
    let metronome = if engine.metronome_running() {
        Span::styled(format!("{beat} click  "), Style::default().fg(Color::Green))
    } else {
        Span::styled("○ click  ", Style::default().fg(Color::DarkGray))
    };

    let recorder = match engine.recorder_state() {
        RecorderState::Idle => Span::styled("rec: idle  ", Style::default().fg(Color::DarkGray)),
        RecorderState::Recording => {
            let secs = elapsed.unwrap_or_default().as_secs_f32();
            Span::styled(format!("● REC {secs:.2}s  "), Style::default().fg(Color::Red))
        }
        RecorderState::Stopped => Span::styled("rec: ready [w]  ", Style::default().fg(Color::Yellow)),
    };

    let mut spans = vec![
        Span::styled(
            format!(" Kit: {}  ", engine.kit_flavor()),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("BPM: {:.0}  ", engine.bpm()),
            Style::default().fg(Color::Cyan),
        ),
        metronome,
        recorder,
        Span::styled(
            format!("Master: {:.2}  ", engine.master_level()),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Latency: {}ms  ", engine.latency_ms()),
            Style::default().fg(Color::White),
        ),
    ];
    if !view.message.is_empty() {
        spans.push(Span::styled(
            view.message.clone(),
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
