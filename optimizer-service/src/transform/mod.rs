use crate::pipeline::{Envelope, PipelineError, Transform};
use energy_core::{Annotated, Reading, RecommendationEngine};
use time::macros::datetime;

/// Pure validation of a `Reading`.
///
/// Rules:
/// - every numeric field must be finite.
/// - appliance loads must be non-negative.
/// - ts must be within a broad sanity window [2000-01-01, 2100-01-01).
pub fn validate_reading(env: Envelope<Reading>) -> Result<Envelope<Reading>, PipelineError> {
    let r = &env.payload;
    let row = env.row;

    for (name, value) in [
        ("kitchen", r.kitchen),
        ("ac", r.ac),
        ("heater", r.heater),
        ("occupancy", r.occupancy),
        ("temp", r.temp),
    ] {
        if !value.is_finite() {
            return Err(PipelineError::Transform(format!("row {row}: {name} must be a finite number")));
        }
    }

    for (name, value) in [("kitchen", r.kitchen), ("ac", r.ac), ("heater", r.heater)] {
        if value < 0.0 {
            return Err(PipelineError::Transform(format!(
                "row {row}: {name} must be non-negative, got {value}"
            )));
        }
    }

    let min_ts = datetime!(2000-01-01 00:00:00 UTC);
    let max_ts = datetime!(2100-01-01 00:00:00 UTC);

    if r.ts < min_ts || r.ts >= max_ts {
        return Err(PipelineError::Transform(format!("row {row}: timestamp out of allowed range")));
    }

    Ok(env)
}

#[derive(Clone, Default)]
pub struct ReadingValidation;

#[async_trait::async_trait]
impl Transform<Reading, Reading> for ReadingValidation {
    async fn apply(&self, input: Envelope<Reading>) -> Result<Envelope<Reading>, PipelineError> {
        match validate_reading(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("validation_reading_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}

/// Attaches a recommendation label to each reading.
#[derive(Clone, Default)]
pub struct Recommend {
    engine: RecommendationEngine,
}

impl Recommend {
    pub fn new(engine: RecommendationEngine) -> Self {
        Self { engine }
    }
}

#[async_trait::async_trait]
impl Transform<Reading, Annotated<Reading>> for Recommend {
    async fn apply(&self, input: Envelope<Reading>) -> Result<Envelope<Annotated<Reading>>, PipelineError> {
        match self.engine.classify_row(input.row, &input.payload) {
            Ok(label) => {
                metrics::counter!("readings_classified_total", "label" => label.as_str()).increment(1);
                let row = input.row;
                Ok(input.map(|reading| Annotated {
                    row,
                    reading,
                    recommendation: label,
                }))
            }
            Err(e) => {
                metrics::counter!("readings_rejected_total").increment(1);
                Err(e.into())
            }
        }
    }
}
