use std::{
    env, fs, io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outcome::OutcomePolicy;

pub const BUILTIN_SIMULATION_CONFIG: &str = include_str!("data/simulation_config.json");

/// Environment variable naming a JSON file that replaces the builtin configuration.
pub const SIMULATION_CONFIG_ENV: &str = "SIM_CONFIG_PATH";

/// Top-level configuration for a simulation session and its host process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed world seed. `None` derives one from the clock at game start.
    pub seed: Option<u64>,
    pub outcome: OutcomePolicy,
    pub turn: TurnConfig,
    pub persistence: PersistenceConfig,
    pub notifications: NotificationConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    pub days_per_turn: u64,
    /// Amount every relation moves toward zero per turn; `0.0` disables decay.
    pub relation_decay_per_turn: f32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            days_per_turn: 1,
            relation_decay_per_turn: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub save_version: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_version: "1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Per-subscriber queue depth; notifications beyond it are dropped for that subscriber.
    pub channel_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub command_bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command_bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 41001),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read simulation config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SimulationConfig {
    pub fn builtin() -> Self {
        match Self::from_json_str(BUILTIN_SIMULATION_CONFIG) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    target: "concord::config",
                    error = %err,
                    "simulation_config.builtin_invalid"
                );
                Self::default()
            }
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }
}

/// Where the active configuration came from. `None` means the builtin defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMetadata {
    path: Option<PathBuf>,
}

impl ConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Load the file named by `SIM_CONFIG_PATH`, falling back to the builtin config.
pub fn load_simulation_config_from_env() -> (SimulationConfig, ConfigMetadata) {
    let override_path = env::var(SIMULATION_CONFIG_ENV).ok().map(PathBuf::from);
    load_simulation_config(override_path.as_deref())
}

pub fn load_simulation_config(path: Option<&Path>) -> (SimulationConfig, ConfigMetadata) {
    if let Some(path) = path {
        match SimulationConfig::from_file(path) {
            Ok(config) => {
                tracing::info!(
                    target: "concord::config",
                    path = %path.display(),
                    "simulation_config.loaded=file"
                );
                return (config, ConfigMetadata::new(Some(path.to_path_buf())));
            }
            Err(err) => {
                tracing::warn!(
                    target: "concord::config",
                    path = %path.display(),
                    error = %err,
                    "simulation_config.load_failed"
                );
            }
        }
    }

    tracing::info!(
        target: "concord::config",
        "simulation_config.loaded=builtin"
    );
    (SimulationConfig::builtin(), ConfigMetadata::new(None))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_matches_defaults() {
        assert_eq!(SimulationConfig::builtin(), SimulationConfig::default());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = SimulationConfig::from_json_str(
            r#"{"seed": 11, "outcome": {"trade_relation_bonus": 15.0}}"#,
        )
        .expect("partial config parses");
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.outcome.trade_relation_bonus, 15.0);
        assert_eq!(config.outcome.trade_keyword, "trade");
        assert_eq!(config.turn.days_per_turn, 1);
    }

    #[test]
    fn file_override_is_recorded() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"turn": {{"days_per_turn": 30}}}}"#).expect("write config");
        let (config, metadata) = load_simulation_config(Some(file.path()));
        assert_eq!(config.turn.days_per_turn, 30);
        assert_eq!(metadata.path(), Some(&file.path().to_path_buf()));
    }

    #[test]
    fn unreadable_override_falls_back_to_builtin() {
        let (config, metadata) =
            load_simulation_config(Some(Path::new("/definitely/not/here.json")));
        assert_eq!(config, SimulationConfig::default());
        assert!(metadata.path().is_none());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = SimulationConfig::from_json_str("{not json").expect_err("invalid json");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
