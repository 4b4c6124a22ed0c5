//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Execution engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Instrument simulator settings
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Execution engine settings
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Batch width for parallel runs
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Fixed delay between retry attempts
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Upper bound for Initialize+Run of a single attempt (0 disables)
    #[serde(default = "default_case_timeout")]
    pub case_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            retry_delay_ms: default_retry_delay(),
            case_timeout_secs: default_case_timeout(),
        }
    }
}

impl EngineConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn case_timeout(&self) -> Option<Duration> {
        (self.case_timeout_secs > 0).then(|| Duration::from_secs(self.case_timeout_secs))
    }
}

fn default_max_concurrency() -> usize {
    4
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_case_timeout() -> u64 {
    60
}

/// Instrument simulator settings
#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Multiplier applied to every simulated instrument delay
    #[serde(default = "default_latency_scale")]
    pub latency_scale: f64,

    /// Probability that a CAN request gets no response
    #[serde(default = "default_can_drop_rate")]
    pub can_drop_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latency_scale: default_latency_scale(),
            can_drop_rate: default_can_drop_rate(),
        }
    }
}

impl SimulationConfig {
    /// Settings for tests: no sleeping, no dropped frames
    pub fn instant() -> Self {
        Self {
            latency_scale: 0.0,
            can_drop_rate: 0.0,
        }
    }
}

fn default_latency_scale() -> f64 {
    1.0
}
fn default_can_drop_rate() -> f64 {
    0.1
}

/// Report output settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ReportConfig {
    /// Directory that relative report paths are placed in
    pub directory: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.engine.max_concurrency == 0 {
            return Err(super::Error::Config(
                "engine.max_concurrency must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.simulation.can_drop_rate) {
            return Err(super::Error::Config(format!(
                "simulation.can_drop_rate must be within 0.0..=1.0, got {}",
                self.simulation.can_drop_rate
            )));
        }
        if self.simulation.latency_scale < 0.0 || !self.simulation.latency_scale.is_finite() {
            return Err(super::Error::Config(format!(
                "simulation.latency_scale must be a non-negative number, got {}",
                self.simulation.latency_scale
            )));
        }
        Ok(())
    }

    /// Resolve where a report should be written
    pub fn report_path(&self, requested: &Path) -> PathBuf {
        match &self.report.directory {
            Some(dir) if requested.is_relative() => dir.join(requested),
            _ => requested.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.engine.max_concurrency, 4);
        assert_eq!(config.engine.retry_delay(), Duration::from_secs(1));
        assert_eq!(config.engine.case_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.simulation.latency_scale, 1.0);
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config: Config = toml::from_str("[engine]\ncase_timeout_secs = 0\n").unwrap();
        assert_eq!(config.engine.case_timeout(), None);
    }

    #[test]
    fn test_load_rejects_zero_concurrency() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nmax_concurrency = 0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(crate::common::Error::Config(_))
        ));
    }

    #[test]
    fn test_report_path_joins_relative() {
        let config: Config = toml::from_str("[report]\ndirectory = \"out\"\n").unwrap();
        assert_eq!(
            config.report_path(Path::new("r.json")),
            PathBuf::from("out/r.json")
        );
        assert_eq!(
            config.report_path(Path::new("/tmp/r.json")),
            PathBuf::from("/tmp/r.json")
        );
    }
}
