use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use udc_executor::DEFAULT_BLOCKED_COMMANDS;

pub const DEFAULT_CONFIG_FILE: &str = "udc.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub default_timeout_ms: u64,
    pub unlock_window_minutes: u32,
    /// Where unlock codes are written. Defaults to `~/.udc_gate_code`.
    pub gate_file: Option<PathBuf>,
    pub blocked_commands: Vec<String>,
    /// Roots the file tools may touch. Empty means unrestricted.
    pub allowed_directories: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            default_timeout_ms: 30_000,
            unlock_window_minutes: 15,
            gate_file: None,
            blocked_commands: DEFAULT_BLOCKED_COMMANDS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            allowed_directories: Vec::new(),
        }
    }
}

impl Config {
    /// Loads `path`, falling back to defaults when it does not exist, then
    /// applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(gate_file) = lookup("UDC_GATE_FILE").filter(|v| !v.trim().is_empty()) {
            self.gate_file = Some(PathBuf::from(gate_file));
        }
        if let Some(level) = lookup("UDC_LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
            self.log_level = level;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_timeout_ms == 0 {
            bail!("default_timeout_ms must be greater than zero");
        }
        if self.unlock_window_minutes == 0 {
            bail!("unlock_window_minutes must be greater than zero");
        }
        if self.log_level.trim().is_empty() {
            bail!("log_level cannot be empty");
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
