//! Smooth Unicode progress bar widget.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::reconcile::fmt_time;
use crate::theme::{C_MUTED, C_PLAYING, C_SECONDARY};

/// Render a smooth progress bar in `area`.
/// `progress` is 0.0..=1.0; `elapsed_ms` and `total_ms` become the labels.
pub fn draw_progress(frame: &mut Frame, area: Rect, progress: f64, elapsed_ms: u64, total_ms: u64) {
    if area.width < 4 || area.height == 0 {
        return;
    }

    let left_label = fmt_time(elapsed_ms);
    let right_label = fmt_time(total_ms);
    let label_w = (left_label.len() + right_label.len() + 2) as u16;
    let bar_w = area.width.saturating_sub(label_w).max(4) as usize;

    // Unicode smooth fill: 8 eighths per cell
    let eighths = (progress.clamp(0.0, 1.0) * bar_w as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

    let mut bar = String::with_capacity(bar_w + 4);
    for _ in 0..full_blocks {
        bar.push('█');
    }
    if full_blocks < bar_w {
        bar.push(BLOCKS[partial]);
        for _ in (full_blocks + 1)..bar_w {
            bar.push(' ');
        }
    }

    let spans = vec![
        Span::styled(format!("{} ", left_label), Style::default().fg(C_SECONDARY)),
        Span::styled(bar, Style::default().fg(C_PLAYING)),
        Span::styled(format!(" {}", right_label), Style::default().fg(C_MUTED)),
    ];

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
