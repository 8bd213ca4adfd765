use std::{fs::File, path::PathBuf};

use futures::StreamExt;

use super::{AnnotatedReading, OutputRecord, OUTPUT_COLUMNS};
use crate::{
    pipeline::{Envelope, PipelineError, Sink},
    presentation::LabelFormat,
};

/// Writes annotated readings to a CSV file, header first.
pub struct CsvFileSink {
    path: PathBuf,
    batch_size: usize,
    label_format: LabelFormat,
}

impl CsvFileSink {
    pub fn new<P: Into<PathBuf>>(path: P, batch_size: usize, label_format: LabelFormat) -> Self {
        Self {
            path: path.into(),
            batch_size: batch_size.max(1),
            label_format,
        }
    }

    fn flush_batch(
        &self,
        writer: &mut csv::Writer<File>,
        batch: &[Envelope<AnnotatedReading>],
    ) -> Result<(), PipelineError> {
        for env in batch {
            writer
                .serialize(OutputRecord::new(&env.payload, self.label_format))
                .map_err(|e| PipelineError::Sink(format!("row {}: failed to write CSV record: {e}", env.row)))?;
        }
        writer
            .flush()
            .map_err(|e| PipelineError::Sink(format!("failed to flush {}: {e}", self.path.display())))?;
        metrics::counter!("annotated_records_written_total").increment(batch.len() as u64);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sink<AnnotatedReading> for CsvFileSink {
    async fn run<S>(&self, mut input: S) -> Result<usize, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<AnnotatedReading>, PipelineError>> + Send + Unpin + 'static,
    {
        let file = File::create(&self.path)
            .map_err(|e| PipelineError::Sink(format!("failed to create {}: {e}", self.path.display())))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(OUTPUT_COLUMNS)
            .map_err(|e| PipelineError::Sink(format!("failed to write CSV header: {e}")))?;

        let mut buffer: Vec<Envelope<AnnotatedReading>> = Vec::with_capacity(self.batch_size);
        let mut written = 0;

        while let Some(item) = input.next().await {
            buffer.push(item?);
            if buffer.len() >= self.batch_size {
                self.flush_batch(&mut writer, &buffer)?;
                written += buffer.len();
                buffer.clear();
            }
        }

        // Always flushes, so an empty input still leaves a header-only file.
        self.flush_batch(&mut writer, &buffer)?;
        written += buffer.len();

        tracing::info!(path = %self.path.display(), written, "annotated readings written");
        Ok(written)
    }
}
