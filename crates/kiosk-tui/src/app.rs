//! App — kiosk event loop.
//!
//! Architecture:
//! - The poller task delivers snapshots over a `tokio::mpsc` channel.
//! - A render-tick task fires every 500 ms so playing progress keeps moving
//!   between polls.
//! - The event loop draws a frame, then awaits the next message.

use std::io;
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::debug;
use unicode_width::UnicodeWidthChar;

use kiosk_proto::model::PlaybackSnapshot;

use crate::reconcile::{DisplayState, Status};
use crate::theme::{style_default, style_muted, style_secondary, C_PRIMARY};
use crate::widgets::{progress_bar, status_bar};

pub enum AppMessage {
    Input(Event),
    Snapshot(PlaybackSnapshot),
    PollFailed(String),
    RenderTick,
}

/// Blocking crossterm reader on its own thread, bridged into the async loop.
pub fn spawn_input_thread(tx: mpsc::Sender<AppMessage>) {
    std::thread::spawn(move || loop {
        match ratatui::crossterm::event::read() {
            Ok(ev) => {
                if tx.blocking_send(AppMessage::Input(ev)).is_err() {
                    return;
                }
            }
            Err(_) => return,
        }
    });
}

/// Cosmetic refresh — progress interpolation between polls.
pub fn spawn_render_tick(tx: mpsc::Sender<AppMessage>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(500));
        loop {
            interval.tick().await;
            if tx.send(AppMessage::RenderTick).await.is_err() {
                return;
            }
        }
    });
}

pub struct App {
    state: DisplayState,
    kiosk: bool,
    force_poll: mpsc::Sender<()>,
    should_quit: bool,
}

impl App {
    pub fn new(kiosk: bool, force_poll: mpsc::Sender<()>) -> Self {
        Self {
            state: DisplayState::new(),
            kiosk,
            force_poll,
            should_quit: false,
        }
    }

    pub async fn run(mut self, mut rx: mpsc::Receiver<AppMessage>) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal, &mut rx).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        rx: &mut mpsc::Receiver<AppMessage>,
    ) -> anyhow::Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;

            let Some(msg) = rx.recv().await else {
                return Ok(());
            };
            self.handle(msg);

            if self.should_quit {
                return Ok(());
            }
        }
    }

    fn handle(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.handle_key(key)
            }
            AppMessage::Input(_) => {}
            AppMessage::Snapshot(snapshot) => {
                self.state.apply(snapshot, Instant::now());
            }
            AppMessage::PollFailed(e) => {
                debug!("degrading status indicator: {e}");
                self.state.apply_error();
            }
            AppMessage::RenderTick => {} // redraw happens on every loop pass
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        // Ctrl+C always exits, kiosk mode or not.
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.kiosk {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') => {
                let _ = self.force_poll.try_send(());
            }
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),    // top spacer
                Constraint::Length(4), // track block
                Constraint::Length(1),
                Constraint::Length(1), // progress bar
                Constraint::Min(0),    // bottom spacer
                Constraint::Length(1), // status bar
            ])
            .split(frame.area());

        self.draw_track_block(frame, chunks[1]);

        let bar_area = inset(chunks[3], 2);
        let now = Instant::now();
        progress_bar::draw_progress(
            frame,
            bar_area,
            self.state.progress_ratio(now),
            self.state.progress_ms_at(now),
            self.state.duration_ms(),
        );

        status_bar::draw_status_bar(
            frame,
            chunks[5],
            self.state.status(),
            self.state.played_at(),
            self.kiosk,
        );
    }

    fn draw_track_block(&self, frame: &mut Frame, area: Rect) {
        let max = area.width.saturating_sub(4) as usize;
        let dim_title = matches!(self.state.status(), Status::Empty);

        let title_style = if dim_title {
            style_muted().add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
        };

        let mut lines = vec![
            Line::from(Span::styled(
                truncate_to_width(self.state.title(), max),
                title_style,
            )),
            Line::from(Span::styled(
                truncate_to_width(&self.state.artist_line(), max),
                style_default(),
            )),
            Line::from(Span::styled(
                truncate_to_width(self.state.album_name(), max),
                style_secondary(),
            )),
        ];
        if let Some(url) = self.state.artwork_url() {
            lines.push(Line::from(Span::styled(
                truncate_to_width(url, max),
                style_muted(),
            )));
        }

        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }
}

fn inset(area: Rect, margin: u16) -> Rect {
    Rect {
        x: area.x + margin.min(area.width / 2),
        width: area.width.saturating_sub(margin * 2),
        ..area
    }
}

fn truncate_to_width(s: &str, max: usize) -> String {
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max {
        return s.to_string();
    }

    let mut out = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w + 1 > max {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push('…');
    out
}
