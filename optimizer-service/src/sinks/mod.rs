pub mod csv_file;
pub mod ndjson_file;
pub mod preview;

pub use csv_file::CsvFileSink;
pub use ndjson_file::NdjsonFileSink;
pub use preview::PreviewSink;

use energy_core::{Annotated, DayNight, Reading};
use time::OffsetDateTime;

use crate::{
    pipeline::{Envelope, PipelineError, Sink},
    presentation::LabelFormat,
};

pub type AnnotatedReading = Annotated<Reading>;

/// Column order of the annotated output file.
pub const OUTPUT_COLUMNS: [&str; 10] = [
    "timestamp",
    "kitchen",
    "ac",
    "heater",
    "occupancy",
    "temp",
    "day_night",
    "total_usage",
    "hour",
    "recommendation",
];

/// One annotated reading as written by the file sinks.
#[derive(Debug, serde::Serialize)]
pub struct OutputRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub kitchen: f64,
    pub ac: f64,
    pub heater: f64,
    pub occupancy: f64,
    pub temp: f64,
    pub day_night: Option<DayNight>,
    pub total_usage: f64,
    pub hour: u8,
    pub recommendation: &'static str,
}

impl OutputRecord {
    pub fn new(a: &AnnotatedReading, format: LabelFormat) -> Self {
        let r = &a.reading;
        Self {
            timestamp: r.ts,
            kitchen: r.kitchen,
            ac: r.ac,
            heater: r.heater,
            occupancy: r.occupancy,
            temp: r.temp,
            day_night: r.day_night,
            total_usage: r.total_usage(),
            hour: r.hour(),
            recommendation: format.render(a.recommendation),
        }
    }
}

/// File sink chosen at runtime from `[output] kind`.
pub enum OutputSink {
    Csv(CsvFileSink),
    Ndjson(NdjsonFileSink),
}

#[async_trait::async_trait]
impl Sink<AnnotatedReading> for OutputSink {
    async fn run<S>(&self, input: S) -> Result<usize, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<AnnotatedReading>, PipelineError>> + Send + Unpin + 'static,
    {
        match self {
            Self::Csv(s) => s.run(input).await,
            Self::Ndjson(s) => s.run(input).await,
        }
    }
}
