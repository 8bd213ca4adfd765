use crate::domain::Reading;

/// The two derived values the engine needs from a record.
///
/// `None` means the value is absent from the record.
pub trait UsageSample {
    fn total_usage(&self) -> Option<f64>;
    fn hour(&self) -> Option<u8>;
}

impl UsageSample for Reading {
    fn total_usage(&self) -> Option<f64> {
        Some(Reading::total_usage(self))
    }

    fn hour(&self) -> Option<u8> {
        Some(Reading::hour(self))
    }
}

impl<T: UsageSample + ?Sized> UsageSample for &T {
    fn total_usage(&self) -> Option<f64> {
        (**self).total_usage()
    }

    fn hour(&self) -> Option<u8> {
        (**self).hour()
    }
}

/// Already-derived usage values, e.g. read back from an exported file.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UsageSnapshot {
    pub total_usage: Option<f64>,
    pub hour: Option<u8>,
}

impl UsageSnapshot {
    pub fn new(total_usage: f64, hour: u8) -> Self {
        Self {
            total_usage: Some(total_usage),
            hour: Some(hour),
        }
    }
}

impl UsageSample for UsageSnapshot {
    fn total_usage(&self) -> Option<f64> {
        self.total_usage
    }

    fn hour(&self) -> Option<u8> {
        self.hour
    }
}
