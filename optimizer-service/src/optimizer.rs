use std::sync::Arc;

use anyhow::{Context, Result};
use energy_core::{AnnotationOutcome, EngineError, Reading, RecommendationEngine};
use futures::StreamExt;

use crate::{
    config::{AppConfig, OutputKind},
    pipeline::{ErrorPolicy, Pipeline, PipelineError, PipelineReport, Source},
    sinks::{AnnotatedReading, CsvFileSink, NdjsonFileSink, OutputSink, PreviewSink},
    sources::ReadingCsvFileSource,
    transform::{self, Recommend},
};

pub type OptimizerPipeline = Pipeline<ReadingCsvFileSource, Reading, AnnotatedReading, PreviewSink<OutputSink>>;

pub fn engine(cfg: &AppConfig) -> Result<RecommendationEngine> {
    RecommendationEngine::new(cfg.recommendation_policy()).context("building recommendation engine")
}

pub fn source(cfg: &AppConfig) -> Result<ReadingCsvFileSource> {
    let delimiter = cfg.input.delimiter_byte()?;
    Ok(ReadingCsvFileSource::new(&cfg.input.path).with_delimiter(delimiter))
}

/// CSV in, validation, classification, preview, file out.
pub fn build_pipeline(cfg: &AppConfig) -> Result<OptimizerPipeline> {
    let out = &cfg.output;
    let sink = match out.kind {
        OutputKind::Csv => OutputSink::Csv(CsvFileSink::new(&out.path, out.batch_size, out.label_format)),
        OutputKind::Ndjson => OutputSink::Ndjson(NdjsonFileSink::new(&out.path, out.batch_size, out.label_format)),
    };

    Ok(Pipeline {
        source: source(cfg)?,
        transforms: vec![Arc::new(transform::ReadingValidation)],
        stage: Arc::new(Recommend::new(engine(cfg)?)),
        sink: PreviewSink::new(sink, out.preview_rows, out.label_format),
        error_policy: cfg.pipeline.error_policy,
    })
}

pub async fn run(cfg: &AppConfig) -> Result<PipelineReport> {
    tracing::info!(
        input = %cfg.input.path.display(),
        output = %cfg.output.path.display(),
        threshold_watts = cfg.policy.high_usage_threshold_watts,
        off_peak_start = cfg.policy.off_peak_start_hour,
        off_peak_end = cfg.policy.off_peak_end_hour,
        "starting optimizer run"
    );

    let report = build_pipeline(cfg)?
        .run()
        .await
        .with_context(|| format!("processing {}", cfg.input.path.display()))?;

    tracing::info!(
        written = report.written,
        rejected = report.rejected.len(),
        "optimizer run finished"
    );
    Ok(report)
}

/// Readings that passed loading and validation, plus the rows that did not.
#[derive(Debug, Default)]
pub struct LoadedReadings {
    pub readings: Vec<Reading>,
    pub rejected: Vec<PipelineError>,
}

/// Read and validate every reading up front.
///
/// With [`ErrorPolicy::FailFast`] the first bad row is returned as the error.
pub async fn load_readings(source: &ReadingCsvFileSource, policy: ErrorPolicy) -> Result<LoadedReadings, PipelineError> {
    let mut stream = source.stream().await;
    let mut loaded = LoadedReadings::default();

    while let Some(item) = stream.next().await {
        match item.and_then(transform::validate_reading) {
            Ok(env) => loaded.readings.push(env.payload),
            Err(e) if policy == ErrorPolicy::CollectErrors => {
                tracing::warn!(error = %e, "skipping bad row");
                loaded.rejected.push(e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(loaded)
}

/// Classify loaded readings under `policy`.
///
/// With [`ErrorPolicy::FailFast`] the first unclassifiable reading is the
/// error; otherwise every failure lands in `errors`.
pub fn annotate_readings<'a>(
    engine: &RecommendationEngine,
    readings: &'a [Reading],
    policy: ErrorPolicy,
) -> Result<AnnotationOutcome<&'a Reading>, EngineError> {
    match policy {
        ErrorPolicy::FailFast => Ok(AnnotationOutcome {
            annotated: engine.annotate(readings)?,
            errors: Vec::new(),
        }),
        ErrorPolicy::CollectErrors => Ok(engine.annotate_collecting(readings)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "timestamp,kitchen,ac,heater,occupancy,temp,day_night\n{body}").unwrap();
        f
    }

    #[tokio::test]
    async fn load_readings_fail_fast() {
        let f = csv_file("2024-01-01 07:00,1,2,3,1,20,Day\n2024-01-01 08:00,1,-2,3,1,20,Day\n");
        let source = ReadingCsvFileSource::new(f.path());
        let err = load_readings(&source, ErrorPolicy::FailFast).await.unwrap_err();
        assert!(matches!(err, PipelineError::Transform(ref m) if m.contains("row 1")));
    }

    #[tokio::test]
    async fn load_readings_collecting() {
        let f = csv_file("2024-01-01 07:00,1,2,3,1,20,Day\nbad,1,2,3,1,20,Day\n2024-01-01 09:00,4,5,6,0,21,Night\n");
        let source = ReadingCsvFileSource::new(f.path());
        let loaded = load_readings(&source, ErrorPolicy::CollectErrors).await.unwrap();
        assert_eq!(loaded.readings.len(), 2);
        assert_eq!(loaded.rejected.len(), 1);
        assert_eq!(loaded.readings[1].total_usage(), 15.0);
    }

    fn reading(hour: u8, heater: f64) -> Reading {
        Reading {
            ts: time::macros::datetime!(2024-01-01 00:00 UTC).replace_hour(hour).unwrap(),
            kitchen: 0.0,
            ac: 0.0,
            heater,
            occupancy: 1.0,
            temp: 10.0,
            day_night: None,
        }
    }

    #[test]
    fn annotate_readings_follows_error_policy() {
        let engine = RecommendationEngine::default();
        let readings = vec![reading(7, 1500.0), reading(8, -5.0), reading(14, 1500.0)];

        let err = annotate_readings(&engine, &readings, ErrorPolicy::FailFast).unwrap_err();
        assert!(matches!(err, EngineError::InvalidReading { row: 1, .. }));

        let outcome = annotate_readings(&engine, &readings, ErrorPolicy::CollectErrors).unwrap();
        let rows: Vec<usize> = outcome.annotated.iter().map(|a| a.row).collect();
        assert_eq!(rows, vec![0, 2]);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn annotate_readings_clean_input_has_no_errors() {
        let engine = RecommendationEngine::default();
        let readings = vec![reading(22, 1500.0), reading(12, 100.0)];
        for policy in [ErrorPolicy::FailFast, ErrorPolicy::CollectErrors] {
            let outcome = annotate_readings(&engine, &readings, policy).unwrap();
            assert!(outcome.is_clean());
            assert_eq!(outcome.annotated.len(), 2);
        }
    }

    #[test]
    fn build_pipeline_rejects_invalid_policy() {
        let mut cfg = AppConfig::default();
        cfg.policy.off_peak_start_hour = 30;
        assert!(build_pipeline(&cfg).is_err());
    }
}
