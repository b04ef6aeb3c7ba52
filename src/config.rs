//! Server configuration.
//!
//! Loaded from a TOML file; a default file is written on first run so
//! operators have something to edit. Every pacing delay is configurable.
//! The delays exist for presentation only and the server is correct at
//! any value, including zero.

use crate::gateway::PacingConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG: &str = "\
[server]
# ip: the address to listen on; defaults to all interfaces
ip = \"0.0.0.0\"
# port: the port to listen on
port = 3001

[pacing]
# delays (milliseconds) between automatic battle events
first_turn_delay_ms = 2000
turn_delay_ms = 1000
ko_delay_ms = 1000
switch_prompt_delay_ms = 1500
next_fight_delay_ms = 4000

# demo accounts: token -> player id
[[tokens]]
token = \"demo-token\"
player = \"demo-trainer\"
";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub pacing: PacingSection,
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            ip: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingSection {
    pub first_turn_delay_ms: u64,
    pub turn_delay_ms: u64,
    pub ko_delay_ms: u64,
    pub switch_prompt_delay_ms: u64,
    pub next_fight_delay_ms: u64,
}

impl Default for PacingSection {
    fn default() -> Self {
        Self {
            first_turn_delay_ms: 2000,
            turn_delay_ms: 1000,
            ko_delay_ms: 1000,
            switch_prompt_delay_ms: 1500,
            next_fight_delay_ms: 4000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntry {
    pub token: String,
    pub player: String,
}

impl ServerConfig {
    /// Read the config file, writing the default one first if it does not
    /// exist. Malformed files fall back to defaults with a warning rather
    /// than refusing to start.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Err(err) = fs::write(path, DEFAULT_CONFIG) {
                tracing::warn!(%err, "could not write default config, using built-in defaults");
            }
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(%err, "malformed config, using built-in defaults");
                    Self::default_with_demo_token()
                }
            },
            Err(err) => {
                tracing::warn!(%err, "unreadable config, using built-in defaults");
                Self::default_with_demo_token()
            }
        }
    }

    fn default_with_demo_token() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config must parse")
    }

    pub fn pacing(&self) -> PacingConfig {
        PacingConfig {
            first_turn_delay: Duration::from_millis(self.pacing.first_turn_delay_ms),
            turn_delay: Duration::from_millis(self.pacing.turn_delay_ms),
            ko_delay: Duration::from_millis(self.pacing.ko_delay_ms),
            switch_prompt_delay: Duration::from_millis(self.pacing.switch_prompt_delay_ms),
            next_fight_delay: Duration::from_millis(self.pacing.next_fight_delay_ms),
        }
    }
}
