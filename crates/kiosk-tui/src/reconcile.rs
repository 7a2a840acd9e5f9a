//! Display reconciliation — the state machine between poll results and the
//! screen.
//!
//! Each poll tick applies one `PlaybackSnapshot`. The last track observed
//! stays sticky: an uninformative poll never blanks a previously rendered
//! track, and a transport failure only degrades the status indicator. While
//! playing, rendered progress extrapolates by wall-time between polls.

use std::time::Instant;

use chrono::{DateTime, Utc};

use kiosk_proto::model::{PlaybackSnapshot, Track};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Empty,
    Playing,
    Paused,
    Error,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Playing => "Playing",
            Status::Paused | Status::Empty => "Paused",
            Status::Error => "Connection Error",
        }
    }
}

pub struct DisplayState {
    track: Option<Track>,
    status: Status,
    /// Progress at the moment of the last informative poll.
    progress_ms: u64,
    artwork_url: Option<String>,
    /// Bumped only when the artwork URL actually changes.
    artwork_swaps: u64,
    /// When the displayed track came from the history endpoint.
    played_at: Option<DateTime<Utc>>,
    polled_at: Option<Instant>,
}

impl DisplayState {
    pub fn new() -> Self {
        Self {
            track: None,
            status: Status::Empty,
            progress_ms: 0,
            artwork_url: None,
            artwork_swaps: 0,
            played_at: None,
            polled_at: None,
        }
    }

    pub fn apply(&mut self, snapshot: PlaybackSnapshot, now: Instant) {
        match snapshot {
            PlaybackSnapshot::Playing { track, progress_ms } => {
                self.swap_artwork(&track);
                self.progress_ms = progress_ms.min(track.duration_ms);
                self.track = Some(track);
                self.status = Status::Playing;
                self.played_at = None;
                self.polled_at = Some(now);
            }
            PlaybackSnapshot::Recent { track, played_at } => {
                self.swap_artwork(&track);
                self.progress_ms = track.duration_ms;
                self.track = Some(track);
                self.status = Status::Paused;
                self.played_at = played_at;
                self.polled_at = Some(now);
            }
            PlaybackSnapshot::Empty => {
                if let Some(track) = &self.track {
                    // Sticky last-known track, frozen at full duration.
                    self.progress_ms = track.duration_ms;
                    self.status = Status::Paused;
                } else {
                    self.progress_ms = 0;
                    self.status = Status::Empty;
                }
                self.polled_at = Some(now);
            }
        }
    }

    /// A poll failed in transit. The status indicator degrades; everything
    /// rendered stays on screen.
    pub fn apply_error(&mut self) {
        self.status = Status::Error;
    }

    fn swap_artwork(&mut self, track: &Track) {
        let incoming = track.artwork_url();
        if incoming != self.artwork_url.as_deref() {
            self.artwork_url = incoming.map(str::to_string);
            self.artwork_swaps += 1;
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn artwork_url(&self) -> Option<&str> {
        self.artwork_url.as_deref()
    }

    pub fn artwork_swaps(&self) -> u64 {
        self.artwork_swaps
    }

    pub fn played_at(&self) -> Option<DateTime<Utc>> {
        self.played_at
    }

    pub fn title(&self) -> &str {
        self.track
            .as_ref()
            .map(|t| t.name.as_str())
            .unwrap_or("No Track Playing")
    }

    pub fn artist_line(&self) -> String {
        self.track
            .as_ref()
            .map(|t| t.artist_line())
            .unwrap_or_else(|| "—".to_string())
    }

    pub fn album_name(&self) -> &str {
        self.track
            .as_ref()
            .map(|t| t.album.name.as_str())
            .unwrap_or("—")
    }

    pub fn duration_ms(&self) -> u64 {
        self.track.as_ref().map(|t| t.duration_ms).unwrap_or(0)
    }

    /// Progress at `now`. Extrapolates elapsed wall-time while playing,
    /// clamped to the track duration; never extrapolates otherwise.
    pub fn progress_ms_at(&self, now: Instant) -> u64 {
        match (self.status, self.polled_at) {
            (Status::Playing, Some(at)) => {
                let elapsed = now.saturating_duration_since(at).as_millis() as u64;
                (self.progress_ms + elapsed).min(self.duration_ms())
            }
            _ => self.progress_ms,
        }
    }

    pub fn progress_ratio(&self, now: Instant) -> f64 {
        let duration = self.duration_ms();
        if duration == 0 {
            return 0.0;
        }
        self.progress_ms_at(now) as f64 / duration as f64
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

/// Format milliseconds as `M:SS`, promoting to `H:MM:SS` past an hour.
pub fn fmt_time(ms: u64) -> String {
    let total = ms / 1000;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_proto::model::{Album, Artist, Image};

    fn track(name: &str, duration_ms: u64, art: Option<&str>) -> Track {
        Track {
            name: name.to_string(),
            artists: vec![Artist {
                name: "Analog Fields".to_string(),
            }],
            album: Album {
                name: "City Lights".to_string(),
                images: art
                    .map(|url| {
                        vec![Image {
                            url: url.to_string(),
                            width: Some(640),
                            height: Some(640),
                        }]
                    })
                    .unwrap_or_default(),
            },
            duration_ms,
        }
    }

    fn playing(name: &str, duration_ms: u64, progress_ms: u64) -> PlaybackSnapshot {
        PlaybackSnapshot::Playing {
            track: track(name, duration_ms, Some("https://img.example/a.jpg")),
            progress_ms,
        }
    }

    #[test]
    fn playing_snapshot_renders_its_progress_ratio() {
        let mut state = DisplayState::new();
        let now = Instant::now();
        state.apply(playing("Night Drive", 241000, 60500), now);

        assert_eq!(state.status(), Status::Playing);
        assert_eq!(state.title(), "Night Drive");
        assert!((state.progress_ratio(now) - 60500.0 / 241000.0).abs() < 1e-9);
    }

    #[test]
    fn empty_poll_without_memory_renders_the_placeholder() {
        let mut state = DisplayState::new();
        state.apply(PlaybackSnapshot::Empty, Instant::now());

        assert_eq!(state.status(), Status::Empty);
        assert_eq!(state.title(), "No Track Playing");
        assert_eq!(state.artist_line(), "—");
        assert_eq!(state.album_name(), "—");
        assert_eq!(state.progress_ms_at(Instant::now()), 0);
        assert_eq!(fmt_time(state.progress_ms_at(Instant::now())), "0:00");
        assert_eq!(fmt_time(state.duration_ms()), "0:00");
    }

    #[test]
    fn empty_poll_with_memory_freezes_the_track_at_full_length() {
        let mut state = DisplayState::new();
        let now = Instant::now();
        state.apply(playing("Night Drive", 240000, 30000), now);
        state.apply(PlaybackSnapshot::Empty, now);

        assert_eq!(state.status(), Status::Paused);
        assert_eq!(state.title(), "Night Drive");
        assert_eq!(state.progress_ms_at(now), 240000);
        assert_eq!(fmt_time(state.progress_ms_at(now)), "4:00");
        assert_eq!(fmt_time(state.duration_ms()), "4:00");
        assert!((state.progress_ratio(now) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn transport_failure_keeps_the_screen() {
        let mut state = DisplayState::new();
        let now = Instant::now();
        state.apply(playing("Night Drive", 241000, 60500), now);
        state.apply_error();

        assert_eq!(state.status(), Status::Error);
        assert_eq!(state.status().label(), "Connection Error");
        assert_eq!(state.title(), "Night Drive");
        // No extrapolation while degraded: progress stays where it was polled.
        assert_eq!(
            state.progress_ms_at(now + std::time::Duration::from_secs(30)),
            60500
        );
    }

    #[test]
    fn artwork_swaps_only_when_the_url_changes() {
        let mut state = DisplayState::new();
        let now = Instant::now();

        state.apply(playing("Night Drive", 241000, 1000), now);
        assert_eq!(state.artwork_swaps(), 1);

        // Identical snapshot: no redundant reload.
        state.apply(playing("Night Drive", 241000, 3000), now);
        assert_eq!(state.artwork_swaps(), 1);
        assert_eq!(state.artwork_url(), Some("https://img.example/a.jpg"));

        state.apply(
            PlaybackSnapshot::Playing {
                track: track("Glass Harbour", 198000, Some("https://img.example/b.jpg")),
                progress_ms: 0,
            },
            now,
        );
        assert_eq!(state.artwork_swaps(), 2);
        assert_eq!(state.artwork_url(), Some("https://img.example/b.jpg"));
    }

    #[test]
    fn extrapolated_progress_is_clamped_to_the_duration() {
        let mut state = DisplayState::new();
        let now = Instant::now();
        state.apply(playing("Night Drive", 240000, 239000), now);

        let later = now + std::time::Duration::from_secs(5);
        assert_eq!(state.progress_ms_at(later), 240000);
        assert!((state.progress_ratio(later) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn playing_progress_advances_between_polls() {
        let mut state = DisplayState::new();
        let now = Instant::now();
        state.apply(playing("Night Drive", 240000, 10000), now);

        let later = now + std::time::Duration::from_millis(1500);
        assert_eq!(state.progress_ms_at(later), 11500);
    }

    #[test]
    fn zero_duration_renders_zero_progress() {
        let mut state = DisplayState::new();
        let now = Instant::now();
        state.apply(playing("Intro", 0, 0), now);
        assert_eq!(state.progress_ratio(now), 0.0);
    }

    #[test]
    fn recent_snapshot_shows_paused_with_play_time() {
        let mut state = DisplayState::new();
        let played = "2024-05-29T16:20:00Z".parse::<DateTime<Utc>>().unwrap();
        state.apply(
            PlaybackSnapshot::Recent {
                track: track("Glass Harbour", 198000, None),
                played_at: Some(played),
            },
            Instant::now(),
        );

        assert_eq!(state.status(), Status::Paused);
        assert_eq!(state.played_at(), Some(played));
        assert_eq!(state.progress_ms_at(Instant::now()), 198000);
    }

    #[test]
    fn fmt_time_promotes_hours() {
        assert_eq!(fmt_time(0), "0:00");
        assert_eq!(fmt_time(59999), "0:59");
        assert_eq!(fmt_time(241000), "4:01");
        assert_eq!(fmt_time(3_723_000), "1:02:03");
    }
}
