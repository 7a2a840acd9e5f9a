//! Wire shapes shared by the server facade and the display client.
//!
//! These mirror the subset of the provider's playback JSON the kiosk actually
//! renders. Unknown fields are ignored on deserialize; the facade re-serializes
//! the same structs, so both ends of the local HTTP surface agree by
//! construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response of the provider's "currently playing" endpoint (status 200).
/// A 204 from the provider carries no body and is represented as `None`
/// wherever this struct appears as `Option<PlayingContext>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayingContext {
    pub is_playing: bool,
    pub progress_ms: Option<u64>,
    pub item: Option<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub artists: Vec<Artist>,
    pub album: Album,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    /// Artwork in descending resolution; the first entry is the largest.
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Response of the "recently played" endpoint (queried with limit 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentlyPlayed {
    #[serde(default)]
    pub items: Vec<PlayHistory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayHistory {
    pub track: Track,
    pub played_at: Option<DateTime<Utc>>,
}

impl Track {
    /// Artist names joined for display.
    pub fn artist_line(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Largest artwork URL, if any.
    pub fn artwork_url(&self) -> Option<&str> {
        self.album.images.first().map(|i| i.url.as_str())
    }
}

/// One poll's worth of playback data, reduced to what the reconciler needs.
#[derive(Debug, Clone)]
pub enum PlaybackSnapshot {
    /// Nothing playing and no track in the response.
    Empty,
    /// A track is actively playing.
    Playing { track: Track, progress_ms: u64 },
    /// A track is known (paused playback or recent-history fallback) but not
    /// currently playing. `played_at` is set when the track came from the
    /// history endpoint.
    Recent {
        track: Track,
        played_at: Option<DateTime<Utc>>,
    },
}

impl PlaybackSnapshot {
    /// Reduce a currently-playing response. `None` (the provider's 204) and a
    /// context without an item both reduce to `Empty`; a context that carries
    /// an item but is not playing reduces to `Recent`.
    pub fn from_current(ctx: Option<PlayingContext>) -> Self {
        match ctx {
            Some(PlayingContext {
                is_playing: true,
                progress_ms,
                item: Some(track),
            }) => PlaybackSnapshot::Playing {
                track,
                progress_ms: progress_ms.unwrap_or(0),
            },
            Some(PlayingContext {
                item: Some(track), ..
            }) => PlaybackSnapshot::Recent {
                track,
                played_at: None,
            },
            _ => PlaybackSnapshot::Empty,
        }
    }

    /// Reduce a recently-played response to its newest entry.
    pub fn from_recent(recent: RecentlyPlayed) -> Self {
        match recent.items.into_iter().next() {
            Some(entry) => PlaybackSnapshot::Recent {
                track: entry.track,
                played_at: entry.played_at,
            },
            None => PlaybackSnapshot::Empty,
        }
    }

    /// True when the snapshot carries track metadata.
    pub fn has_track(&self) -> bool {
        !matches!(self, PlaybackSnapshot::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYING_JSON: &str = r#"{
        "timestamp": 1717000000000,
        "progress_ms": 60500,
        "is_playing": true,
        "currently_playing_type": "track",
        "item": {
            "name": "Night Drive",
            "duration_ms": 241000,
            "artists": [{"name": "Analog Fields"}, {"name": "Mira Voss"}],
            "album": {
                "name": "City Lights",
                "images": [
                    {"url": "https://img.example/640.jpg", "width": 640, "height": 640},
                    {"url": "https://img.example/300.jpg", "width": 300, "height": 300}
                ]
            }
        }
    }"#;

    const RECENT_JSON: &str = r#"{
        "items": [
            {
                "track": {
                    "name": "Glass Harbour",
                    "duration_ms": 198000,
                    "artists": [{"name": "Analog Fields"}],
                    "album": {"name": "City Lights", "images": []}
                },
                "played_at": "2024-05-29T16:20:00.000Z"
            }
        ]
    }"#;

    #[test]
    fn test_parse_currently_playing() {
        let ctx: PlayingContext = serde_json::from_str(PLAYING_JSON).unwrap();
        assert!(ctx.is_playing);
        assert_eq!(ctx.progress_ms, Some(60500));
        let track = ctx.item.unwrap();
        assert_eq!(track.name, "Night Drive");
        assert_eq!(track.artist_line(), "Analog Fields, Mira Voss");
        assert_eq!(track.artwork_url(), Some("https://img.example/640.jpg"));
    }

    #[test]
    fn test_parse_recently_played() {
        let recent: RecentlyPlayed = serde_json::from_str(RECENT_JSON).unwrap();
        assert_eq!(recent.items.len(), 1);
        let entry = &recent.items[0];
        assert_eq!(entry.track.name, "Glass Harbour");
        assert!(entry.played_at.is_some());
        assert_eq!(entry.track.artwork_url(), None);
    }

    #[test]
    fn test_snapshot_from_playing_context() {
        let ctx: PlayingContext = serde_json::from_str(PLAYING_JSON).unwrap();
        match PlaybackSnapshot::from_current(Some(ctx)) {
            PlaybackSnapshot::Playing { track, progress_ms } => {
                assert_eq!(track.name, "Night Drive");
                assert_eq!(progress_ms, 60500);
            }
            other => panic!("expected Playing, got {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_from_paused_context() {
        let mut ctx: PlayingContext = serde_json::from_str(PLAYING_JSON).unwrap();
        ctx.is_playing = false;
        match PlaybackSnapshot::from_current(Some(ctx)) {
            PlaybackSnapshot::Recent { track, played_at } => {
                assert_eq!(track.name, "Night Drive");
                assert!(played_at.is_none());
            }
            other => panic!("expected Recent, got {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_empty_cases() {
        assert!(!PlaybackSnapshot::from_current(None).has_track());

        let ctx = PlayingContext {
            is_playing: true,
            progress_ms: Some(1000),
            item: None,
        };
        assert!(!PlaybackSnapshot::from_current(Some(ctx)).has_track());

        let empty = RecentlyPlayed { items: vec![] };
        assert!(!PlaybackSnapshot::from_recent(empty).has_track());
    }

    #[test]
    fn test_snapshot_from_recent() {
        let recent: RecentlyPlayed = serde_json::from_str(RECENT_JSON).unwrap();
        match PlaybackSnapshot::from_recent(recent) {
            PlaybackSnapshot::Recent { track, played_at } => {
                assert_eq!(track.name, "Glass Harbour");
                assert!(played_at.is_some());
            }
            other => panic!("expected Recent, got {:?}", other),
        }
    }

    #[test]
    fn test_facade_round_trip() {
        // The facade deserializes the provider body and re-serializes the same
        // struct for the display client.
        let ctx: PlayingContext = serde_json::from_str(PLAYING_JSON).unwrap();
        let forwarded = serde_json::to_string(&ctx).unwrap();
        let again: PlayingContext = serde_json::from_str(&forwarded).unwrap();
        assert_eq!(again.item.unwrap().duration_ms, 241000);
    }
}
