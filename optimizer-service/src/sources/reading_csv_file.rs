use std::{fs::File, path::PathBuf};

use csv::StringRecord;
use energy_core::{DayNight, Reading};
use time::{macros::format_description, OffsetDateTime, PrimitiveDateTime};

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// CSV source for household `Reading`s.
///
/// Expected header columns (by name):
/// - timestamp (RFC3339, or `YYYY-MM-DD HH:MM[:SS]` taken as UTC)
/// - kitchen, ac, heater (Watts)
/// - occupancy (number or true/false/yes/no)
/// - temp
/// - day_night (optional, Day/Night)
///
/// Any other column is ignored, including derived columns written by a
/// previous run.
pub struct ReadingCsvFileSource {
    path: PathBuf,
    delimiter: u8,
}

impl ReadingCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    /// Use `|` for pipe-delimited `.dat` exports.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

pub(crate) fn parse_timestamp(s: &str) -> Result<OffsetDateTime, String> {
    let s = s.trim();
    if let Ok(ts) = OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339) {
        return Ok(ts);
    }
    let with_seconds = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let without_seconds = format_description!("[year]-[month]-[day] [hour]:[minute]");
    PrimitiveDateTime::parse(s, with_seconds)
        .or_else(|_| PrimitiveDateTime::parse(s, without_seconds))
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| e.to_string())
}

fn parse_occupancy(s: &str) -> Result<f64, String> {
    let trimmed = s.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "yes" => Ok(1.0),
        "false" | "no" => Ok(0.0),
        _ => trimmed.parse().map_err(|e: std::num::ParseFloatError| e.to_string()),
    }
}

fn record_to_reading(row: usize, record: &StringRecord, headers: &StringRecord) -> Result<Reading, PipelineError> {
    let get = |name: &str| -> Result<&str, PipelineError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .and_then(|idx| record.get(idx))
            .ok_or_else(|| PipelineError::Source(format!("row {row}: missing column '{name}'")))
    };
    let invalid = |name: &str, value: &str, e: String| {
        PipelineError::Source(format!("row {row}: invalid {name} '{value}': {e}"))
    };
    let number = |name: &str| -> Result<f64, PipelineError> {
        let s = get(name)?;
        s.trim()
            .parse()
            .map_err(|e: std::num::ParseFloatError| invalid(name, s, e.to_string()))
    };

    let ts_str = get("timestamp")?;
    let ts = parse_timestamp(ts_str).map_err(|e| invalid("timestamp", ts_str, e))?;

    let occupancy_str = get("occupancy")?;
    let occupancy = parse_occupancy(occupancy_str).map_err(|e| invalid("occupancy", occupancy_str, e))?;

    let day_night = match get("day_night") {
        Ok(s) if !s.trim().is_empty() => {
            Some(s.parse::<DayNight>().map_err(|e| invalid("day_night", s, e.to_string()))?)
        }
        _ => None,
    };

    Ok(Reading {
        ts,
        kitchen: number("kitchen")?,
        ac: number("ac")?,
        heater: number("heater")?,
        occupancy,
        temp: number("temp")?,
        day_night,
    })
}

#[async_trait::async_trait]
impl Source<Reading> for ReadingCsvFileSource {
    async fn stream(&self) -> EnvelopeStream<Reading> {
        // Blocking CSV reader; input files are small enough to read inline.
        let path = self.path.clone();
        let delimiter = self.delimiter;
        let s = async_stream::stream! {
            let file = match File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::Source(format!("failed to open {}: {e}", path.display())));
                    return;
                }
            };
            let mut rdr = csv::ReaderBuilder::new()
                .delimiter(delimiter)
                .flexible(true)
                .from_reader(file);
            let headers = match rdr.headers() {
                Ok(h) => h.clone(),
                Err(e) => {
                    yield Err(PipelineError::Source(format!("failed to read CSV headers: {e}")));
                    return;
                }
            };

            // A bad row is reported and skipped; the error policy downstream
            // decides whether the run stops.
            for (row, result) in rdr.records().enumerate() {
                let record = match result {
                    Ok(record) => record,
                    Err(e) => {
                        let io = e.is_io_error();
                        yield Err(PipelineError::Source(format!("row {row}: failed to read CSV record: {e}")));
                        if io {
                            return;
                        }
                        continue;
                    }
                };

                match record_to_reading(row, &record, &headers) {
                    Ok(reading) => {
                        yield Ok(Envelope::new(row, reading));
                    }
                    Err(e) => {
                        metrics::counter!("reading_csv_parse_errors_total").increment(1);
                        yield Err(e);
                    }
                }
            }
        };

        Box::pin(s)
    }
}
