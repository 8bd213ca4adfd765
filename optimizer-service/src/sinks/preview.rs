use futures::StreamExt;

use super::AnnotatedReading;
use crate::{
    pipeline::{Envelope, PipelineError, Sink},
    presentation::LabelFormat,
};

/// Logs the first `rows` annotated readings, then hands everything to `inner`.
pub struct PreviewSink<K> {
    inner: K,
    rows: usize,
    label_format: LabelFormat,
}

impl<K> PreviewSink<K> {
    pub fn new(inner: K, rows: usize, label_format: LabelFormat) -> Self {
        Self {
            inner,
            rows,
            label_format,
        }
    }
}

#[async_trait::async_trait]
impl<K> Sink<AnnotatedReading> for PreviewSink<K>
where
    K: Sink<AnnotatedReading>,
{
    async fn run<S>(&self, input: S) -> Result<usize, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<AnnotatedReading>, PipelineError>> + Send + Unpin + 'static,
    {
        let limit = self.rows;
        let format = self.label_format;
        let mut shown = 0;

        let previewed = input.inspect(move |item| {
            if let Ok(env) = item {
                if shown < limit {
                    shown += 1;
                    let r = &env.payload.reading;
                    tracing::info!(
                        row = env.row,
                        timestamp = %r.ts,
                        total_usage = r.total_usage(),
                        hour = r.hour(),
                        recommendation = format.render(env.payload.recommendation),
                        "recommendation"
                    );
                }
            }
        });

        self.inner.run(previewed).await
    }
}
