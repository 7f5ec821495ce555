//! Configuration types for glbsplice

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{GlbError, Result};

/// Repair configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Container whose JSON chunk is kept
    pub current: PathBuf,
    /// Container supplying the trusted BIN chunk
    pub backup: PathBuf,
    /// Destination; defaults to `current`
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Reader settings
    #[serde(default)]
    pub read: ReadConfig,
    /// Writer settings
    #[serde(default)]
    pub write: WriteConfig,
}

/// Reader settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadConfig {
    /// Reject chunks whose payload runs past the end of the file
    #[serde(default)]
    pub strict: bool,
}

/// Writer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteConfig {
    /// Write to a temp file and rename over the destination
    #[serde(default = "default_atomic")]
    pub atomic: bool,
}

fn default_atomic() -> bool {
    true
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self { atomic: true }
    }
}

impl Config {
    /// Configuration repairing `current` in place from `backup`
    #[must_use]
    pub fn new(current: impl Into<PathBuf>, backup: impl Into<PathBuf>) -> Self {
        Self {
            current: current.into(),
            backup: backup.into(),
            output: None,
            read: ReadConfig::default(),
            write: WriteConfig::default(),
        }
    }

    /// Load configuration from TOML file
    ///
    /// Relative paths are resolved against the config file's directory.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed, or fails validation
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GlbError::ConfigError(format!("Failed to read config file: {e}")))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| GlbError::ConfigError(format!("Failed to parse config: {e}")))?;

        if let Some(base) = path.parent() {
            config.current = base.join(&config.current);
            config.backup = base.join(&config.backup);
            config.output = config.output.map(|output| base.join(output));
        }

        config.validate()?;
        Ok(config)
    }

    /// Destination path
    #[must_use]
    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.current)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if an input is missing or both inputs are the same file
    pub fn validate(&self) -> Result<()> {
        for (role, path) in [("current", &self.current), ("backup", &self.backup)] {
            if !path.is_file() {
                return Err(GlbError::ConfigError(format!(
                    "{role} file does not exist: {}",
                    path.display()
                )));
            }
        }

        let same = match (self.current.canonicalize(), self.backup.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.current == self.backup,
        };
        if same {
            return Err(GlbError::ConfigError(format!(
                "current and backup are the same file: {}",
                self.current.display()
            )));
        }

        if self.output_path().as_os_str().is_empty() {
            return Err(GlbError::ConfigError("output path cannot be empty".to_string()));
        }

        Ok(())
    }
}
