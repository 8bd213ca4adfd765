use super::EngineError;

pub const DEFAULT_HIGH_USAGE_THRESHOLD_WATTS: f64 = 1000.0;
pub const DEFAULT_OFF_PEAK_START_HOUR: u8 = 21;
pub const DEFAULT_OFF_PEAK_END_HOUR: u8 = 9;

/// Thresholds driving [`RecommendationEngine`](super::RecommendationEngine).
///
/// The off-peak window is the half-open hour range
/// `[off_peak_start_hour, off_peak_end_hour)`, wrapping past midnight when the
/// start is later than the end. The defaults give "before 09:00 or from 21:00".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationPolicy {
    /// Usage strictly above this is high usage.
    pub high_usage_threshold_watts: f64,
    pub off_peak_start_hour: u8,
    pub off_peak_end_hour: u8,
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            high_usage_threshold_watts: DEFAULT_HIGH_USAGE_THRESHOLD_WATTS,
            off_peak_start_hour: DEFAULT_OFF_PEAK_START_HOUR,
            off_peak_end_hour: DEFAULT_OFF_PEAK_END_HOUR,
        }
    }
}

impl RecommendationPolicy {
    pub fn validate(&self) -> Result<(), EngineError> {
        let t = self.high_usage_threshold_watts;
        if !t.is_finite() || t < 0.0 {
            return Err(EngineError::InvalidPolicy(format!(
                "high usage threshold must be a non-negative number, got {t}"
            )));
        }
        for (name, hour) in [
            ("off_peak_start_hour", self.off_peak_start_hour),
            ("off_peak_end_hour", self.off_peak_end_hour),
        ] {
            if hour > 23 {
                return Err(EngineError::InvalidPolicy(format!("{name} must be 0-23, got {hour}")));
            }
        }
        if self.off_peak_start_hour == self.off_peak_end_hour {
            return Err(EngineError::InvalidPolicy(
                "off-peak window start and end must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_off_peak(&self, hour: u8) -> bool {
        let (start, end) = (self.off_peak_start_hour, self.off_peak_end_hour);
        if start > end {
            hour >= start || hour < end
        } else {
            hour >= start && hour < end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_wraps_midnight() {
        let p = RecommendationPolicy::default();
        let off_peak: Vec<u8> = (0..24).filter(|h| p.is_off_peak(*h)).collect();
        assert_eq!(off_peak, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 21, 22, 23]);
    }

    #[test]
    fn non_wrapping_window() {
        let p = RecommendationPolicy {
            off_peak_start_hour: 1,
            off_peak_end_hour: 5,
            ..Default::default()
        };
        assert!(!p.is_off_peak(0));
        assert!(p.is_off_peak(1));
        assert!(p.is_off_peak(4));
        assert!(!p.is_off_peak(5));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let bad_threshold = RecommendationPolicy {
            high_usage_threshold_watts: f64::NAN,
            ..Default::default()
        };
        assert!(bad_threshold.validate().is_err());

        let negative = RecommendationPolicy {
            high_usage_threshold_watts: -5.0,
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let bad_hour = RecommendationPolicy {
            off_peak_start_hour: 24,
            ..Default::default()
        };
        assert!(bad_hour.validate().is_err());

        assert!(RecommendationPolicy::default().validate().is_ok());
    }
}
