use std::path::PathBuf;

use futures::StreamExt;
use tokio::{fs::File, io::AsyncWriteExt};

use super::{AnnotatedReading, OutputRecord};
use crate::{
    pipeline::{Envelope, PipelineError, Sink},
    presentation::LabelFormat,
};

/// Writes one JSON object per annotated reading.
pub struct NdjsonFileSink {
    path: PathBuf,
    batch_size: usize,
    label_format: LabelFormat,
}

impl NdjsonFileSink {
    pub fn new<P: Into<PathBuf>>(path: P, batch_size: usize, label_format: LabelFormat) -> Self {
        Self {
            path: path.into(),
            batch_size: batch_size.max(1),
            label_format,
        }
    }

    async fn flush_batch(&self, file: &mut File, batch: &[Envelope<AnnotatedReading>]) -> Result<(), PipelineError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::new();
        for env in batch {
            serde_json::to_writer(&mut buf, &OutputRecord::new(&env.payload, self.label_format))
                .map_err(|e| PipelineError::Sink(format!("row {}: failed to encode JSON: {e}", env.row)))?;
            buf.push(b'\n');
        }

        file.write_all(&buf)
            .await
            .map_err(|e| PipelineError::Sink(format!("failed to write {}: {e}", self.path.display())))?;
        file.flush()
            .await
            .map_err(|e| PipelineError::Sink(format!("failed to flush {}: {e}", self.path.display())))?;
        metrics::counter!("annotated_records_written_total").increment(batch.len() as u64);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sink<AnnotatedReading> for NdjsonFileSink {
    async fn run<S>(&self, mut input: S) -> Result<usize, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<AnnotatedReading>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut file = File::create(&self.path)
            .await
            .map_err(|e| PipelineError::Sink(format!("failed to create {}: {e}", self.path.display())))?;

        let mut buffer: Vec<Envelope<AnnotatedReading>> = Vec::with_capacity(self.batch_size);
        let mut written = 0;

        while let Some(item) = input.next().await {
            buffer.push(item?);
            if buffer.len() >= self.batch_size {
                self.flush_batch(&mut file, &buffer).await?;
                written += buffer.len();
                buffer.clear();
            }
        }

        self.flush_batch(&mut file, &buffer).await?;
        written += buffer.len();

        tracing::info!(path = %self.path.display(), written, "annotated readings written");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_core::{Label, Reading};
    use time::macros::datetime;

    #[tokio::test]
    async fn writes_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ndjson");
        let sink = NdjsonFileSink::new(&path, 2, LabelFormat::Symbolic);

        let items: Vec<Result<Envelope<AnnotatedReading>, PipelineError>> = (0..3)
            .map(|row| {
                let reading = Reading {
                    ts: datetime!(2024-06-01 14:00 UTC),
                    kitchen: 500.0,
                    ac: 700.0,
                    heater: 0.0,
                    occupancy: 2.0,
                    temp: 31.0,
                    day_night: None,
                };
                Ok(Envelope::new(
                    row,
                    AnnotatedReading {
                        row,
                        reading,
                        recommendation: Label::ShiftSuggested,
                    },
                ))
            })
            .collect();

        let written = sink.run(futures::stream::iter(items)).await.unwrap();
        assert_eq!(written, 3);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["timestamp"], "2024-06-01T14:00:00Z");
        assert_eq!(lines[0]["total_usage"], 1200.0);
        assert_eq!(lines[0]["hour"], 14);
        assert_eq!(lines[0]["recommendation"], "SHIFT_SUGGESTED");
        assert!(lines[0]["day_night"].is_null());
    }
}
