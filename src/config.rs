//! Service configuration.
//!
//! A single YAML file with serde defaults, overridable by environment
//! variables and CLI flags (CLI wins over env wins over file).
//!
//! ## Environment Variables
//! - `PLANBOARD_CONFIG_PATH` - Explicit config file
//! - `PLANBOARD_DB_PATH` - Database path
//! - `PLANBOARD_PORT` - HTTP port

use crate::db::DeletionPolicy;
use crate::schedule::CompletedDatePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path. Defaults to `planboard.db` under the platform data
    /// directory.
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn resolve_path(&self) -> PathBuf {
        if let Some(ref path) = self.path {
            return path.clone();
        }
        dirs::data_local_dir()
            .map(|d| d.join("planboard").join("planboard.db"))
            .unwrap_or_else(|| PathBuf::from("planboard.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Whether recalculation preserves or recomputes dates on completed tasks.
    pub completed_dates: CompletedDatePolicy,
    /// What deleting a task with dependents does.
    pub on_delete_with_dependents: DeletionPolicy,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Resolution order for the file: explicit path argument,
    /// `PLANBOARD_CONFIG_PATH`, then `~/.planboard/config.yaml` if present,
    /// otherwise built-in defaults. Env overrides apply afterwards.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = explicit
            .map(PathBuf::from)
            .or_else(|| std::env::var("PLANBOARD_CONFIG_PATH").ok().map(PathBuf::from))
            .or_else(|| {
                let default = dirs::home_dir()?.join(".planboard").join("config.yaml");
                default.exists().then_some(default)
            });

        let mut config = match file {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                serde_yaml::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => AppConfig::default(),
        };

        if let Ok(db_path) = std::env::var("PLANBOARD_DB_PATH") {
            config.database.path = Some(PathBuf::from(db_path));
        }
        if let Ok(port) = std::env::var("PLANBOARD_PORT") {
            config.server.port = port
                .parse()
                .with_context(|| format!("PLANBOARD_PORT is not a port number: {port}"))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.schedule.completed_dates,
            CompletedDatePolicy::Preserve
        );
        assert_eq!(
            config.schedule.on_delete_with_dependents,
            DeletionPolicy::Reject
        );
    }

    #[test]
    fn partial_yaml_keeps_defaults_elsewhere() {
        let config: AppConfig = serde_yaml::from_str(
            "schedule:\n  completed_dates: recompute\nserver:\n  port: 9090\n",
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.schedule.completed_dates,
            CompletedDatePolicy::Recompute
        );
        assert_eq!(
            config.schedule.on_delete_with_dependents,
            DeletionPolicy::Reject
        );
        assert!(config.database.path.is_none());
    }

    #[test]
    fn deletion_policy_parses_lowercase() {
        let config: AppConfig =
            serde_yaml::from_str("schedule:\n  on_delete_with_dependents: cascade\n").unwrap();
        assert_eq!(
            config.schedule.on_delete_with_dependents,
            DeletionPolicy::Cascade
        );
    }
}
