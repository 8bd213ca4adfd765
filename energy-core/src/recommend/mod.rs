//! Rule-based "shift your usage" classification.
//!
//! A reading is high-usage when its total load strictly exceeds the policy
//! threshold. High-usage readings inside the off-peak window are a good time
//! to run appliances; outside it a shift is suggested. Everything else is
//! normal.

mod policy;
mod sample;

pub use policy::{
    RecommendationPolicy, DEFAULT_HIGH_USAGE_THRESHOLD_WATTS, DEFAULT_OFF_PEAK_END_HOUR, DEFAULT_OFF_PEAK_START_HOUR,
};
pub use sample::{UsageSample, UsageSnapshot};

use crate::domain::Label;

/// Why a single reading could not be classified.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ReadingDefect {
    #[error("total usage is missing")]
    MissingTotalUsage,
    #[error("total usage is not a finite number ({0})")]
    NonNumericTotalUsage(f64),
    #[error("total usage is negative ({0} W)")]
    NegativeTotalUsage(f64),
    #[error("hour is missing")]
    MissingHour,
    #[error("hour {0} is outside 0-23")]
    HourOutOfRange(u8),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid reading at row {row}: {defect}")]
    InvalidReading { row: usize, defect: ReadingDefect },
    #[error("invalid recommendation policy: {0}")]
    InvalidPolicy(String),
}

/// A reading together with the label assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotated<S> {
    /// Position of the reading in the input sequence.
    pub row: usize,
    pub reading: S,
    pub recommendation: Label,
}

/// Result of [`RecommendationEngine::annotate_collecting`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationOutcome<S> {
    pub annotated: Vec<Annotated<S>>,
    pub errors: Vec<EngineError>,
}

impl<S> AnnotationOutcome<S> {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationEngine {
    policy: RecommendationPolicy,
}

impl RecommendationEngine {
    pub fn new(policy: RecommendationPolicy) -> Result<Self, EngineError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &RecommendationPolicy {
        &self.policy
    }

    /// Classify one sample. Pure; the same sample always yields the same label.
    pub fn classify<S: UsageSample + ?Sized>(&self, sample: &S) -> Result<Label, ReadingDefect> {
        let total = sample.total_usage().ok_or(ReadingDefect::MissingTotalUsage)?;
        if !total.is_finite() {
            return Err(ReadingDefect::NonNumericTotalUsage(total));
        }
        if total < 0.0 {
            return Err(ReadingDefect::NegativeTotalUsage(total));
        }

        let hour = sample.hour().ok_or(ReadingDefect::MissingHour)?;
        if hour > 23 {
            return Err(ReadingDefect::HourOutOfRange(hour));
        }

        if total <= self.policy.high_usage_threshold_watts {
            Ok(Label::Normal)
        } else if self.policy.is_off_peak(hour) {
            Ok(Label::GoodTime)
        } else {
            Ok(Label::ShiftSuggested)
        }
    }

    /// [`classify`](Self::classify) with the row index attached to any error.
    pub fn classify_row<S: UsageSample + ?Sized>(&self, row: usize, sample: &S) -> Result<Label, EngineError> {
        self.classify(sample)
            .map_err(|defect| EngineError::InvalidReading { row, defect })
    }

    /// Lazily annotate a sequence, yielding one result per input in order.
    pub fn annotate_iter<I, S>(&self, readings: I) -> impl Iterator<Item = Result<Annotated<S>, EngineError>>
    where
        I: IntoIterator<Item = S>,
        S: UsageSample,
    {
        let engine = *self;
        readings.into_iter().enumerate().map(move |(row, reading)| {
            let recommendation = engine.classify_row(row, &reading)?;
            Ok(Annotated {
                row,
                reading,
                recommendation,
            })
        })
    }

    /// Annotate every reading, stopping at the first invalid one.
    ///
    /// An empty input yields an empty output.
    pub fn annotate<I, S>(&self, readings: I) -> Result<Vec<Annotated<S>>, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: UsageSample,
    {
        self.annotate_iter(readings).collect()
    }

    /// Annotate every valid reading and report every invalid one.
    pub fn annotate_collecting<I, S>(&self, readings: I) -> AnnotationOutcome<S>
    where
        I: IntoIterator<Item = S>,
        S: UsageSample,
    {
        let mut outcome = AnnotationOutcome {
            annotated: Vec::new(),
            errors: Vec::new(),
        };
        for result in self.annotate_iter(readings) {
            match result {
                Ok(a) => outcome.annotated.push(a),
                Err(e) => outcome.errors.push(e),
            }
        }
        outcome
    }
}
