// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Mediator configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/bt-syspopup/config.toml`. A missing file
//! yields the built-in defaults; command line flags are applied on top.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::bus::{
    AGENT_INTERFACE, AGENT_SERVICE, OBEX_INTERFACE, OBEX_PATH, OBEX_SERVICE, SERVICE_INTERFACE,
    SERVICE_PATH, SIGNAL_INTERFACE, SIGNAL_PATH,
};

const CONFIG_DIR: &str = "bt-syspopup";
const CONFIG_FILE: &str = "config.toml";

/// Which message bus to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    #[default]
    System,
    /// Used when running against a test daemon.
    Session,
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusKind::System => write!(f, "system"),
            BusKind::Session => write!(f, "session"),
        }
    }
}

/// Bluetooth agent naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub service: String,
    pub interface: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            service: AGENT_SERVICE.to_string(),
            interface: AGENT_INTERFACE.to_string(),
        }
    }
}

/// Object push agent naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObexConfig {
    pub service: String,
    pub path: String,
    pub interface: String,
}

impl Default for ObexConfig {
    fn default() -> Self {
        Self {
            service: OBEX_SERVICE.to_string(),
            path: OBEX_PATH.to_string(),
            interface: OBEX_INTERFACE.to_string(),
        }
    }
}

/// Request handler of the Bluetooth service, reached under the agent's
/// well-known name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub path: String,
    pub interface: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            path: SERVICE_PATH.to_string(),
            interface: SERVICE_INTERFACE.to_string(),
        }
    }
}

/// Where response signals come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub path: String,
    pub interface: String,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            path: SIGNAL_PATH.to_string(),
            interface: SIGNAL_INTERFACE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bus: BusKind,
    /// Exit after the first request has been answered.
    pub one_shot: bool,
    /// Default log filter; `RUST_LOG` takes precedence.
    pub log_level: String,
    pub agent: AgentConfig,
    pub obex: ObexConfig,
    pub service: ServiceConfig,
    pub signal: SignalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus: BusKind::System,
            one_shot: true,
            log_level: "info".to_string(),
            agent: AgentConfig::default(),
            obex: ObexConfig::default(),
            service: ServiceConfig::default(),
            signal: SignalConfig::default(),
        }
    }
}

impl Config {
    /// Default location of the config file, if a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicitly given path must exist; the default one may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file {:?} does not exist", path);
                }
                path.to_path_buf()
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bus, BusKind::System);
        assert!(config.one_shot);
        assert_eq!(config.agent.service, "org.projectx.bt");
        assert_eq!(config.obex.path, "/org/obex/ops_agent");
        assert_eq!(config.signal.interface, "User.Bluetooth.syspopup");
        assert_eq!(config.service.path, "/org/projectx/bt_service");
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "bus = \"session\"\none_shot = false\n\n[agent]\nservice = \"org.example.bt\"\n",
        )?;

        let config = Config::load(Some(&path))?;
        assert_eq!(config.bus, BusKind::Session);
        assert!(!config.one_shot);
        assert_eq!(config.agent.service, "org.example.bt");
        assert_eq!(config.agent.interface, "org.bluez.Agent1");
        assert_eq!(config.obex, ObexConfig::default());
        assert_eq!(config.log_level, "info");
        Ok(())
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        assert!(Config::load(Some(&temp_dir.path().join("nope.toml"))).is_err());
        Ok(())
    }

    #[test]
    fn test_invalid_file_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "bus = \"carrier-pigeon\"\n")?;

        assert!(Config::load(Some(&path)).is_err());
        Ok(())
    }
}
