use super::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAMES: [&str; 2] = ["dockscale.yaml", "dockscale.yml"];

pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Find config file starting from current directory
    pub fn find_config_file(&self) -> Result<PathBuf> {
        let current_dir = std::env::current_dir()?;
        Self::find_config_in_dir(&current_dir)
    }

    pub fn find_config_in_dir(dir: &Path) -> Result<PathBuf> {
        for name in CONFIG_FILE_NAMES {
            let config_path = dir.join(name);
            if config_path.exists() {
                return Ok(config_path);
            }
        }

        // Try parent directory
        if let Some(parent) = dir.parent() {
            return Self::find_config_in_dir(parent);
        }

        Err(Error::Config(
            "Could not find dockscale.yaml in current directory or any parent".to_string(),
        ))
    }

    /// Load config from file path.
    ///
    /// Relative `build` contexts are resolved against the directory holding
    /// the config file.
    pub fn load_config<P: AsRef<Path>>(&self, path: P) -> Result<Config> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config = self.parse_config(&content)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        for definition in config.services.values_mut() {
            if let Some(context) = definition.config.build.as_mut() {
                if context.is_relative() {
                    *context = base_dir.join(&*context);
                }
            }
        }

        Ok(config)
    }

    /// Parse config from YAML string
    pub fn parse_config(&self, content: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
