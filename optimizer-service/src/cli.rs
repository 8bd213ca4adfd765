use std::path::PathBuf;

use clap::{Args, Parser};

use crate::{
    config::{AppConfig, ConfigError, OutputKind},
    pipeline::ErrorPolicy,
    presentation::LabelFormat,
};

/// Flags shared by every binary.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Set the logging level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Path to the TOML config file (overrides $OPTIMIZER_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Input CSV of appliance readings
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Input field delimiter, e.g. '|' for .dat exports
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Stop at the first bad row or skip and report bad rows
    #[arg(long, value_enum)]
    pub error_policy: Option<ErrorPolicy>,

    /// High-usage threshold in Watts
    #[arg(long)]
    pub threshold: Option<f64>,

    /// First off-peak hour (inclusive)
    #[arg(long)]
    pub off_peak_start: Option<u8>,

    /// First hour after the off-peak window (exclusive)
    #[arg(long)]
    pub off_peak_end: Option<u8>,
}

impl CommonArgs {
    /// Config file contents with these flags applied on top.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let mut cfg = self.base_config()?;
        self.apply(&mut cfg);
        Ok(cfg)
    }

    fn base_config(&self) -> Result<AppConfig, ConfigError> {
        match &self.config {
            Some(path) => AppConfig::from_path(path),
            None => AppConfig::load(),
        }
    }

    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(input) = &self.input {
            cfg.input.path = input.clone();
        }
        if let Some(d) = self.delimiter {
            cfg.input.delimiter = d;
        }
        if let Some(p) = self.error_policy {
            cfg.pipeline.error_policy = p;
        }
        if let Some(t) = self.threshold {
            cfg.policy.high_usage_threshold_watts = t;
        }
        if let Some(h) = self.off_peak_start {
            cfg.policy.off_peak_start_hour = h;
        }
        if let Some(h) = self.off_peak_end {
            cfg.policy.off_peak_end_hour = h;
        }
    }
}

/// Classify household energy readings and suggest off-peak usage.
#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
pub struct OptimizeCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Where to write the annotated readings
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output file format
    #[arg(long, value_enum)]
    pub format: Option<OutputKind>,

    /// How recommendation labels are written
    #[arg(long, value_enum)]
    pub labels: Option<LabelFormat>,

    /// Number of annotated rows to log as a preview
    #[arg(long)]
    pub preview_rows: Option<usize>,
}

impl OptimizeCli {
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let mut cfg = self.common.base_config()?;
        self.apply(&mut cfg);
        Ok(cfg)
    }

    pub fn apply(&self, cfg: &mut AppConfig) {
        self.common.apply(cfg);
        if let Some(output) = &self.output {
            cfg.output.path = output.clone();
        }
        if let Some(kind) = self.format {
            cfg.output.kind = kind;
        }
        if let Some(labels) = self.labels {
            cfg.output.label_format = labels;
        }
        if let Some(rows) = self.preview_rows {
            cfg.output.preview_rows = rows;
        }
    }
}

/// Summarise household energy readings: averages, day/night split, peak and
/// temperature correlation.
#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
pub struct ReportCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// How recommendation labels are printed
    #[arg(long, value_enum, default_value = "message")]
    pub labels: LabelFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = OptimizeCli::parse_from([
            "optimizer-service",
            "--input",
            "in.csv",
            "--output",
            "out.ndjson",
            "--format",
            "ndjson",
            "--labels",
            "message",
            "--threshold",
            "750",
            "--off-peak-start",
            "22",
            "--error-policy",
            "collect-errors",
        ]);
        let mut cfg = AppConfig::default();
        cli.apply(&mut cfg);

        assert_eq!(cfg.input.path, PathBuf::from("in.csv"));
        assert_eq!(cfg.output.path, PathBuf::from("out.ndjson"));
        assert_eq!(cfg.output.kind, OutputKind::Ndjson);
        assert_eq!(cfg.output.label_format, LabelFormat::Message);
        assert_eq!(cfg.policy.high_usage_threshold_watts, 750.0);
        assert_eq!(cfg.policy.off_peak_start_hour, 22);
        assert_eq!(cfg.policy.off_peak_end_hour, 9);
        assert_eq!(cfg.pipeline.error_policy, ErrorPolicy::CollectErrors);
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = OptimizeCli::parse_from(["optimizer-service"]);
        let mut cfg = AppConfig::default();
        cfg.output.preview_rows = 3;
        cli.apply(&mut cfg);
        assert_eq!(cfg.output.preview_rows, 3);
        assert_eq!(cli.common.log_level, tracing::Level::INFO);
    }

    #[test]
    fn report_defaults_to_message_labels() {
        let cli = ReportCli::parse_from(["usage_report", "-i", "data.csv"]);
        assert_eq!(cli.labels, LabelFormat::Message);
        assert_eq!(cli.common.input, Some(PathBuf::from("data.csv")));
    }
}
