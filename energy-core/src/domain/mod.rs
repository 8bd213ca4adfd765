pub mod label;
pub mod reading;

pub use label::{Label, ParseLabelError};
pub use reading::{DayNight, ParseDayNightError, Reading};
