use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding JSON saves
    pub save_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let save_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".repbudget")
            .join("saves");
        Self { save_dir }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when no -v/-q flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Reference-host simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated hours per tick at normal rate
    pub tick_hours: f64,
    /// Time acceleration engaged after each contract
    pub warp_rate: f64,
    pub starting_funds: f64,
    pub starting_reputation: f64,
    /// Days between contract completions (0 disables contracts)
    pub contract_interval_days: f64,
    pub contract_funds: f64,
    pub contract_reputation: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_hours: 6.0,
            warp_rate: 1.0,
            starting_funds: 25_000.0,
            starting_reputation: 0.0,
            contract_interval_days: 30.0,
            contract_funds: 5_000.0,
            contract_reputation: 10.0,
        }
    }
}

impl SimulationConfig {
    /// Reject settings that would stall or corrupt a run
    pub fn validate(&self) -> Result<()> {
        if !(self.tick_hours > 0.0 && self.tick_hours.is_finite()) {
            bail!("simulation.tick_hours must be positive, got {}", self.tick_hours);
        }
        if !(self.warp_rate >= 1.0 && self.warp_rate.is_finite()) {
            bail!("simulation.warp_rate must be at least 1, got {}", self.warp_rate);
        }
        if !(self.contract_interval_days >= 0.0 && self.contract_interval_days.is_finite()) {
            bail!(
                "simulation.contract_interval_days must be non-negative, got {}",
                self.contract_interval_days
            );
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from the default path, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, creating default if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        config.simulation.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".repbudget").join("config.toml"))
    }
}
