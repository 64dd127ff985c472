use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::relay::DEFAULT_QUEUE_CAPACITY;
use crate::simulator::SimulatedUser;

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub queue_capacity: usize,
    pub welcome_message: String,
    pub simulated_users: Vec<SimulatedUserConfig>,
    pub demo: DemoConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            welcome_message: "Welcome to the chat. Simulated users: Alice, Bob, Eve.".to_string(),
            simulated_users: default_roster(),
            demo: DemoConfig::default(),
        }
    }
}

impl AppConfig {
    /// Users that should be started at launch.
    pub fn enabled_users(&self) -> Vec<SimulatedUser> {
        self.simulated_users
            .iter()
            .filter(|user| user.enabled)
            .map(SimulatedUserConfig::to_user)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedUserConfig {
    pub name: String,
    pub messages: Vec<String>,
    pub interval_ms: u64,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl SimulatedUserConfig {
    fn new(name: &str, messages: &[&str], interval_ms: u64, enabled: bool) -> Self {
        Self {
            name: name.to_string(),
            messages: messages.iter().map(|text| text.to_string()).collect(),
            interval_ms,
            enabled,
        }
    }

    pub fn to_user(&self) -> SimulatedUser {
        SimulatedUser::new(
            self.name.clone(),
            self.messages.clone(),
            Duration::from_millis(self.interval_ms),
        )
    }
}

fn enabled_by_default() -> bool {
    true
}

// Eve's lines ship with the roster but she only speaks when sent manually.
fn default_roster() -> Vec<SimulatedUserConfig> {
    vec![
        SimulatedUserConfig::new(
            "Alice",
            &["Hello!", "Anyone up for coffee?", "I am debugging Rust code."],
            3_000,
            true,
        ),
        SimulatedUserConfig::new(
            "Bob",
            &["Hey all", "I pushed a change to the repo", "Will test now"],
            5_000,
            true,
        ),
        SimulatedUserConfig::new(
            "Eve",
            &["Good morning :)", "Reminder: meeting at 3pm", "Nice work team!"],
            4_000,
            false,
        ),
    ]
}

/// Pauses used by the scripted demo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub initial_delay_ms: u64,
    pub between_sends_ms: u64,
    pub settle_delay_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_200,
            between_sends_ms: 800,
            settle_delay_ms: 3_200,
        }
    }
}

pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Load the config file, falling back to defaults when it is missing or broken.
pub fn load_config(path: &str) -> AppConfig {
    match read_config(Path::new(path)) {
        Ok(config) => config,
        Err(err @ ConfigError::Read { .. }) => {
            log::info!("{err}; using defaults");
            AppConfig::default()
        }
        Err(err @ ConfigError::Parse { .. }) => {
            log::warn!("{err}; using defaults");
            AppConfig::default()
        }
    }
}
