pub mod analytics;
pub mod domain;
pub mod recommend;

pub use domain::{DayNight, Label, Reading};
pub use recommend::{
    Annotated, AnnotationOutcome, EngineError, ReadingDefect, RecommendationEngine, RecommendationPolicy, UsageSample,
    UsageSnapshot,
};
