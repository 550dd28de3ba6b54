//! Relay configuration.
//!
//! Loaded from an optional TOML file; every field has a default, so an
//! empty file (or no file at all) gives a working local setup. Command-line
//! flags are applied on top by the binary.
//!
//! ```toml
//! io_timeout_secs = 30
//! relay_poll_interval_ms = 100
//! roster_slots = 16
//!
//! [server]
//! host = "play.example.org"
//! auth_port = 54231
//! data_port = 54230
//!
//! [lobby]
//! port = 51220
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use xirelay_session::Endpoint;

use crate::roster::MAX_ROSTER_SLOTS;
use crate::RelayError;

/// The remote server cluster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// Port of the account protocol.
    pub auth_port: u16,
    /// Port the game-data session connects to.
    pub data_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            auth_port: 54231,
            data_port: 54230,
        }
    }
}

/// The local lobby relay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    pub port: u16,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self { port: 51220 }
    }
}

/// Everything the relay needs to run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub lobby: LobbyConfig,
    /// Deadline for account-protocol and lobby I/O. `0` waits forever.
    pub io_timeout_secs: u64,
    /// Pause between game-data relay iterations.
    pub relay_poll_interval_ms: u64,
    /// Capacity of the character roster, in records.
    pub roster_slots: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            lobby: LobbyConfig::default(),
            io_timeout_secs: 30,
            relay_poll_interval_ms: 100,
            roster_slots: 16,
        }
    }
}

impl RelayConfig {
    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let text = std::fs::read_to_string(path).map_err(|e| RelayError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::from_toml_str(&text).map_err(|e| RelayError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Clamps values the relay cannot run with.
    pub fn validated(mut self) -> Self {
        if self.roster_slots == 0 {
            tracing::warn!("roster_slots must be at least 1, using 1");
            self.roster_slots = 1;
        }
        if self.roster_slots > MAX_ROSTER_SLOTS {
            tracing::warn!(
                roster_slots = self.roster_slots,
                max = MAX_ROSTER_SLOTS,
                "roster_slots too large, clamping"
            );
            self.roster_slots = MAX_ROSTER_SLOTS;
        }
        if self.relay_poll_interval_ms == 0 {
            tracing::warn!("relay_poll_interval_ms must be at least 1, using 1");
            self.relay_poll_interval_ms = 1;
        }
        self
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        (self.io_timeout_secs > 0).then(|| Duration::from_secs(self.io_timeout_secs))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.relay_poll_interval_ms)
    }

    pub fn auth_endpoint(&self) -> Endpoint {
        Endpoint::new(self.server.host.clone(), self.server.auth_port)
    }

    pub fn data_endpoint(&self) -> Endpoint {
        Endpoint::new(self.server.host.clone(), self.server.data_port)
    }
}
