//! # Configuration
//!
//! Castaway reads a small TOML file at startup:
//!
//! ```toml
//! [game]
//! catalog_path = "data/seeds/catalog.json"
//! db_path = "data/castaway.db"
//! maintenance_mode = false
//! operators = ["1001"]
//! mutation_timeout_ms = 5000
//! starting_name = "Castaway"
//!
//! [logging]
//! level = "info"
//! file = "castaway.log"
//! ```
//!
//! Island content (areas, items, tuning numbers) lives in the separate JSON
//! catalog named by `catalog_path`; see [`crate::game::catalog`].
//!
//! ```rust,no_run
//! use castaway::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("catalog: {}", config.game.catalog_path);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::game::coordinator::DEFAULT_MUTATION_TIMEOUT_MS;
use crate::game::types::ActionContext;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub catalog_path: String,
    pub db_path: String,
    /// While set, only operators may act.
    #[serde(default)]
    pub maintenance_mode: bool,
    /// Player ids allowed to act during maintenance.
    #[serde(default)]
    pub operators: Vec<String>,
    #[serde(default = "default_mutation_timeout_ms")]
    pub mutation_timeout_ms: u64,
    /// Display name for players created without one.
    #[serde(default = "default_starting_name")]
    pub starting_name: String,
}

fn default_mutation_timeout_ms() -> u64 {
    DEFAULT_MUTATION_TIMEOUT_MS
}

fn default_starting_name() -> String {
    "Castaway".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub game: GameConfig,
    pub logging: LoggingConfig,
}

impl GameConfig {
    pub fn mutation_timeout(&self) -> Duration {
        Duration::from_millis(self.mutation_timeout_ms.max(1))
    }

    pub fn is_operator(&self, player_id: &str) -> bool {
        self.operators.iter().any(|op| op == player_id)
    }

    /// Per-call context for an action by `player_id`.
    pub fn action_context(&self, player_id: &str) -> ActionContext {
        ActionContext {
            maintenance: self.maintenance_mode,
            operator: self.is_operator(player_id),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            game: GameConfig {
                catalog_path: "data/seeds/catalog.json".to_string(),
                db_path: "data/castaway.db".to_string(),
                maintenance_mode: false,
                operators: Vec::new(),
                mutation_timeout_ms: DEFAULT_MUTATION_TIMEOUT_MS,
                starting_name: default_starting_name(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("castaway.log".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn default_config_round_trips_through_disk() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        let path = path.to_str().expect("utf8 path");
        Config::create_default(path).await.expect("write");
        let loaded = Config::load(path).await.expect("load");
        assert_eq!(loaded.game.catalog_path, "data/seeds/catalog.json");
        assert_eq!(loaded.game.mutation_timeout_ms, DEFAULT_MUTATION_TIMEOUT_MS);
        assert_eq!(loaded.logging.file.as_deref(), Some("castaway.log"));
    }

    #[test]
    fn optional_game_keys_fall_back() {
        let text = r#"
            [game]
            catalog_path = "catalog.json"
            db_path = "db"

            [logging]
            level = "debug"
        "#;
        let config: Config = toml::from_str(text).expect("parse");
        assert!(!config.game.maintenance_mode);
        assert!(config.game.operators.is_empty());
        assert_eq!(config.game.starting_name, "Castaway");
        assert_eq!(config.game.mutation_timeout(), Duration::from_millis(5_000));
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn action_context_marks_operators() {
        let mut config = Config::default();
        config.game.maintenance_mode = true;
        config.game.operators = vec!["42".to_string()];
        assert!(!config.game.action_context("42").is_blocked());
        assert!(config.game.action_context("7").is_blocked());
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = Config::load("/nonexistent/castaway.toml")
            .await
            .expect_err("missing");
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
