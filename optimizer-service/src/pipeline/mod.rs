use std::{
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
    time::SystemTime,
};

use energy_core::EngineError;
use futures::{Stream, StreamExt};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    /// 0-based data row index assigned by the source.
    pub row: usize,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn new(row: usize, payload: T) -> Self {
        Self {
            payload,
            row,
            received_at: SystemTime::now(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            payload: f(self.payload),
            row: self.row,
            received_at: self.received_at,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("sink error: {0}")]
    Sink(String),
    #[error(transparent)]
    Recommendation(#[from] EngineError),
}

/// What the pipeline does with a row that fails to load, validate or classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop at the first bad row and return its error.
    #[default]
    FailFast,
    /// Drop bad rows, keep going, and report them at the end.
    CollectErrors,
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub written: usize,
    pub rejected: Vec<PipelineError>,
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    /// Consume the stream and return the number of records written.
    async fn run<S>(&self, input: S) -> Result<usize, PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

/// source -> same-type transforms -> stage -> sink.
pub struct Pipeline<S, I, O, K> {
    pub source: S,
    pub transforms: Vec<Arc<dyn Transform<I, I> + Send + Sync>>,
    pub stage: Arc<dyn Transform<I, O> + Send + Sync>,
    pub sink: K,
    pub error_policy: ErrorPolicy,
}

fn apply_transform<I, O>(stream: EnvelopeStream<I>, t: Arc<dyn Transform<I, O> + Send + Sync>) -> EnvelopeStream<O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    Box::pin(stream.then(move |item| {
        let t_inner = t.clone();
        async move {
            match item {
                Ok(env) => t_inner.apply(env).await,
                Err(e) => Err(e),
            }
        }
    }))
}

impl<S, I, O, K> Pipeline<S, I, O, K>
where
    I: Send + 'static,
    O: Send + 'static,
    S: Source<I> + Send + Sync + 'static,
    K: Sink<O> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<PipelineReport, PipelineError> {
        let mut stream = self.source.stream().await;

        // Apply transforms in sequence (if any).
        for t in self.transforms {
            stream = apply_transform(stream, t);
        }
        let mut classified = apply_transform(stream, self.stage);

        let rejected: Arc<Mutex<Vec<PipelineError>>> = Arc::default();
        let halted: Arc<Mutex<Option<PipelineError>>> = Arc::default();
        let policy = self.error_policy;

        let gated = {
            let rejected = rejected.clone();
            let halted = halted.clone();
            Box::pin(async_stream::stream! {
                while let Some(item) = classified.next().await {
                    match item {
                        Ok(env) => yield Ok(env),
                        Err(e) => match policy {
                            ErrorPolicy::FailFast => {
                                tracing::error!(error = %e, "halting pipeline at first bad row");
                                *halted.lock().unwrap_or_else(PoisonError::into_inner) = Some(e);
                                break;
                            }
                            ErrorPolicy::CollectErrors => {
                                tracing::warn!(error = %e, "skipping bad row");
                                rejected.lock().unwrap_or_else(PoisonError::into_inner).push(e);
                            }
                        },
                    }
                }
            })
        };

        let written = self.sink.run(gated).await?;

        if let Some(e) = halted.lock().unwrap_or_else(PoisonError::into_inner).take() {
            return Err(e);
        }
        let rejected = std::mem::take(&mut *rejected.lock().unwrap_or_else(PoisonError::into_inner));

        Ok(PipelineReport { written, rejected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecSource(Vec<Result<u32, String>>);

    #[async_trait::async_trait]
    impl Source<u32> for VecSource {
        async fn stream(&self) -> EnvelopeStream<u32> {
            let items: Vec<_> = self
                .0
                .iter()
                .cloned()
                .enumerate()
                .map(|(row, item)| item.map(|v| Envelope::new(row, v)).map_err(PipelineError::Source))
                .collect();
            Box::pin(futures::stream::iter(items))
        }
    }

    struct Double;

    #[async_trait::async_trait]
    impl Transform<u32, u32> for Double {
        async fn apply(&self, input: Envelope<u32>) -> Result<Envelope<u32>, PipelineError> {
            Ok(input.map(|v| v * 2))
        }
    }

    struct Describe;

    #[async_trait::async_trait]
    impl Transform<u32, String> for Describe {
        async fn apply(&self, input: Envelope<u32>) -> Result<Envelope<String>, PipelineError> {
            if input.payload > 100 {
                return Err(PipelineError::Transform(format!("row {} too large", input.row)));
            }
            Ok(input.map(|v| format!("v={v}")))
        }
    }

    #[derive(Default)]
    struct CollectSink(Arc<Mutex<Vec<(usize, String)>>>);

    #[async_trait::async_trait]
    impl Sink<String> for CollectSink {
        async fn run<S>(&self, mut input: S) -> Result<usize, PipelineError>
        where
            S: Stream<Item = Result<Envelope<String>, PipelineError>> + Send + Unpin + 'static,
        {
            let mut n = 0;
            while let Some(item) = input.next().await {
                let env = item?;
                self.0.lock().unwrap().push((env.row, env.payload));
                n += 1;
            }
            Ok(n)
        }
    }

    fn pipeline(
        items: Vec<Result<u32, String>>,
        policy: ErrorPolicy,
    ) -> (Pipeline<VecSource, u32, String, CollectSink>, Arc<Mutex<Vec<(usize, String)>>>) {
        let sink = CollectSink::default();
        let seen = sink.0.clone();
        let p = Pipeline {
            source: VecSource(items),
            transforms: vec![Arc::new(Double)],
            stage: Arc::new(Describe),
            sink,
            error_policy: policy,
        };
        (p, seen)
    }

    #[tokio::test]
    async fn runs_transforms_in_order() {
        let (p, seen) = pipeline(vec![Ok(1), Ok(2), Ok(3)], ErrorPolicy::FailFast);
        let report = p.run().await.unwrap();

        assert_eq!(report.written, 3);
        assert!(report.rejected.is_empty());
        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![(0, "v=2".to_string()), (1, "v=4".to_string()), (2, "v=6".to_string())]
        );
    }

    #[tokio::test]
    async fn fail_fast_stops_at_first_error() {
        let (p, seen) = pipeline(vec![Ok(1), Ok(60), Ok(3)], ErrorPolicy::FailFast);
        let err = p.run().await.unwrap_err();

        assert!(matches!(err, PipelineError::Transform(ref m) if m.contains("row 1")));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn collect_errors_keeps_going() {
        let (p, seen) = pipeline(
            vec![Ok(1), Err("bad csv".into()), Ok(60), Ok(3)],
            ErrorPolicy::CollectErrors,
        );
        let report = p.run().await.unwrap();

        assert_eq!(report.written, 2);
        assert_eq!(report.rejected.len(), 2);
        assert!(matches!(report.rejected[0], PipelineError::Source(_)));
        let rows: Vec<usize> = seen.lock().unwrap().iter().map(|(r, _)| *r).collect();
        assert_eq!(rows, vec![0, 3]);
    }
}
