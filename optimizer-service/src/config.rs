use std::{
    env, fs,
    path::{Path, PathBuf},
};

use energy_core::{
    recommend::{DEFAULT_HIGH_USAGE_THRESHOLD_WATTS, DEFAULT_OFF_PEAK_END_HOUR, DEFAULT_OFF_PEAK_START_HOUR},
    RecommendationPolicy,
};
use serde::Deserialize;

use crate::{pipeline::ErrorPolicy, presentation::LabelFormat};

pub const CONFIG_ENV_VAR: &str = "OPTIMIZER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "optimizer-config.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub high_usage_threshold_watts: f64,
    pub off_peak_start_hour: u8,
    pub off_peak_end_hour: u8,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            high_usage_threshold_watts: DEFAULT_HIGH_USAGE_THRESHOLD_WATTS,
            off_peak_start_hour: DEFAULT_OFF_PEAK_START_HOUR,
            off_peak_end_hour: DEFAULT_OFF_PEAK_END_HOUR,
        }
    }
}

impl From<&PolicyConfig> for RecommendationPolicy {
    fn from(c: &PolicyConfig) -> Self {
        RecommendationPolicy {
            high_usage_threshold_watts: c.high_usage_threshold_watts,
            off_peak_start_hour: c.off_peak_start_hour,
            off_peak_end_hour: c.off_peak_end_hour,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub path: PathBuf,
    /// Single ASCII field separator.
    pub delimiter: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/sample_data.csv"),
            delimiter: ',',
        }
    }
}

impl InputConfig {
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| ConfigError::Invalid(format!("input delimiter '{}' is not ASCII", self.delimiter)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    #[default]
    Csv,
    Ndjson,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub kind: OutputKind,
    pub path: PathBuf,
    pub label_format: LabelFormat,
    pub batch_size: usize,
    pub preview_rows: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            kind: OutputKind::Csv,
            path: PathBuf::from("data/optimized_output.csv"),
            label_format: LabelFormat::Symbolic,
            batch_size: 500,
            preview_rows: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub error_policy: ErrorPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub policy: PolicyConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub pipeline: PipelineConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Load from `$OPTIMIZER_CONFIG`, else `optimizer-config.toml` if present,
    /// else built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_path(path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_path(DEFAULT_CONFIG_PATH),
            Err(_) => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: AppConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    pub fn recommendation_policy(&self) -> RecommendationPolicy {
        RecommendationPolicy::from(&self.policy)
    }
}
