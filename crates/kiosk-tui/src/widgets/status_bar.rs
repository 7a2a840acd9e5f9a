//! Status bar — bottom line with connection state, playback status, and keys.

use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::reconcile::Status;
use crate::theme::{C_ACCENT, C_MUTED, C_PAUSED, C_PLAYING, C_SECONDARY};

fn status_color(status: Status) -> ratatui::style::Color {
    match status {
        Status::Playing => C_PLAYING,
        Status::Paused | Status::Empty => C_PAUSED,
        Status::Error => C_ACCENT,
    }
}

/// Draw the status line: connection dot, status label, optional last-played
/// time, and key hints (suppressed in kiosk mode).
pub fn draw_status_bar(
    frame: &mut Frame,
    area: Rect,
    status: Status,
    played_at: Option<DateTime<Utc>>,
    kiosk: bool,
) {
    let dot = if status == Status::Error {
        Span::styled("○", Style::default().fg(C_ACCENT))
    } else {
        Span::styled("●", Style::default().fg(C_PLAYING))
    };

    let mut spans = vec![
        dot,
        Span::raw(" "),
        Span::styled(
            status.label(),
            Style::default()
                .fg(status_color(status))
                .add_modifier(Modifier::BOLD),
        ),
    ];

    if status == Status::Paused {
        if let Some(at) = played_at {
            spans.push(Span::styled(
                format!("  last played {}", at.with_timezone(&Local).format("%H:%M")),
                Style::default().fg(C_SECONDARY),
            ));
        }
    }

    if !kiosk {
        spans.push(Span::styled(
            "  r refresh  q quit",
            Style::default().fg(C_MUTED),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
