use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Listen surface of the local API facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Credentials and endpoints for the remote provider.
///
/// The secrets default to empty strings; they are normally injected via the
/// `SPOTIFY_*` environment variables rather than written into the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Token exchange endpoint. Overridable so tests can point at a mock.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// API host for the playback endpoints.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Base URL of the facade the display client polls.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Kiosk mode: ignore quit keys so an unattended display can't be closed
    /// from the keyboard (Ctrl+C still works).
    #[serde(default)]
    pub kiosk: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            token_url: default_token_url(),
            api_base: default_api_base(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            poll_interval_secs: default_poll_interval_secs(),
            kiosk: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            spotify: SpotifyConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_token_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_api_base() -> String {
    "https://api.spotify.com".to_string()
}

fn default_server_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// Environment wins over the TOML file for secrets and the listen port.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SPOTIFY_CLIENT_ID") {
            self.spotify.client_id = v;
        }
        if let Ok(v) = std::env::var("SPOTIFY_CLIENT_SECRET") {
            self.spotify.client_secret = v;
        }
        if let Ok(v) = std::env::var("SPOTIFY_REFRESH_TOKEN") {
            self.spotify.refresh_token = v;
        }
        if let Ok(v) = std::env::var("KIOSK_PORT") {
            if let Ok(port) = v.parse() {
                self.http.port = port;
            }
        }
    }

    /// True when all three provider secrets are present.
    pub fn has_credentials(&self) -> bool {
        !self.spotify.client_id.is_empty()
            && !self.spotify.client_secret.is_empty()
            && !self.spotify.refresh_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.http.port, 3000);
        assert_eq!(config.http.bind_address, "127.0.0.1");
        assert_eq!(config.display.poll_interval_secs, 2);
        assert!(!config.display.kiosk);
        assert!(config.spotify.token_url.starts_with("https://accounts."));
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [spotify]
            client_id = "abc"
            client_secret = "def"
            refresh_token = "ghi"

            [display]
            kiosk = true
            "#,
        )
        .unwrap();

        assert!(config.has_credentials());
        assert!(config.display.kiosk);
        assert_eq!(config.http.port, 3000);
        assert_eq!(config.spotify.api_base, "https://api.spotify.com");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.http.port, config.http.port);
        assert_eq!(parsed.display.server_url, config.display.server_url);
    }
}
