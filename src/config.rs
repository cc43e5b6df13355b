use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tracing::warn;

use mdcommand_testkit::FeedbackSettings;

pub const DEFAULT_CONFIG_PATH: &str = "config/mdcommand.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Permission level of the console that runs commands (0-4).
    pub permission_level: u8,
    pub send_command_feedback: bool,
    pub broadcast_to_ops: bool,
    /// World fixture loaded at startup; an empty world when unset.
    pub world: Option<PathBuf>,
    /// Seed for `@r` when the world fixture does not set one.
    pub seed: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            permission_level: 4,
            send_command_feedback: true,
            broadcast_to_ops: true,
            world: None,
            seed: 0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        let mut config = match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ServerConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    ServerConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!(
                        "Server config not found at {}. Using defaults",
                        path.display()
                    );
                }
                ServerConfig::default()
            }
        };
        if config.permission_level > 4 {
            warn!(
                "permission_level {} is above 4; clamping",
                config.permission_level
            );
            config.permission_level = 4;
        }
        config
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    pub fn feedback_settings(&self) -> FeedbackSettings {
        FeedbackSettings {
            send_command_feedback: self.send_command_feedback,
            broadcast_to_ops: self.broadcast_to_ops,
        }
    }
}
