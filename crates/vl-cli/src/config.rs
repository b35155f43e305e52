//! Configuration file loading (`viewlineage.yml`)

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::cli::{AnalyzeArgs, OutputFormat};

/// Config file looked up in the working directory when `--config` is absent
pub(crate) const DEFAULT_CONFIG_FILE: &str = "viewlineage.yml";

/// Settings read from the config file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// SQL dialect passed to the analyzer
    #[serde(default = "default_dialect")]
    pub dialect: String,

    /// Default output format for `analyze`
    #[serde(default)]
    pub output: OutputFormat,

    /// Maximum number of concurrent analyses
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Per-view time limit in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// File extensions picked up from directories
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_dialect() -> String {
    vl_sql::DEFAULT_DIALECT.to_string()
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_extensions() -> Vec<String> {
    vec!["sql".to_string(), "ddl".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            output: OutputFormat::default(),
            jobs: default_jobs(),
            timeout_ms: default_timeout_ms(),
            extensions: default_extensions(),
        }
    }
}

impl Config {
    /// Load a config file
    pub(crate) fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Parse config YAML; an empty document yields the defaults
    pub(crate) fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the explicit config, or the default file if it exists
    pub(crate) fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply command-line overrides for `analyze`
    pub(crate) fn with_analyze_overrides(mut self, args: &AnalyzeArgs) -> Result<Self> {
        if let Some(dialect) = &args.dialect {
            self.dialect = dialect.clone();
        }
        if let Some(output) = args.output {
            self.output = output;
        }
        if let Some(jobs) = args.jobs {
            self.jobs = jobs;
        }
        if let Some(timeout_ms) = args.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            bail!("jobs must be at least 1");
        }
        if self.timeout_ms == 0 {
            bail!("timeout_ms must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
