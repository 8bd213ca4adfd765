use time::OffsetDateTime;

use crate::{
    domain::{DayNight, Label, Reading},
    recommend::Annotated,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsagePoint {
    pub ts: OffsetDateTime,
    pub total_usage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplianceAverages {
    pub kitchen: f64,
    pub ac: f64,
    pub heater: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DayNightSplit {
    pub day_watts: f64,
    pub night_watts: f64,
    /// Readings without a day/night tag.
    pub unlabelled: usize,
}

impl DayNightSplit {
    /// Day fraction of the labelled total, `None` when nothing was drawn.
    pub fn day_share(&self) -> Option<f64> {
        let total = self.day_watts + self.night_watts;
        if total > 0.0 {
            Some(self.day_watts / total)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakUsage {
    pub row: usize,
    pub ts: OffsetDateTime,
    pub total_usage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelCounts {
    pub normal: usize,
    pub good_time: usize,
    pub shift_suggested: usize,
}

impl LabelCounts {
    pub fn record(&mut self, label: Label) {
        match label {
            Label::Normal => self.normal += 1,
            Label::GoodTime => self.good_time += 1,
            Label::ShiftSuggested => self.shift_suggested += 1,
        }
    }

    pub fn get(&self, label: Label) -> usize {
        match label {
            Label::Normal => self.normal,
            Label::GoodTime => self.good_time,
            Label::ShiftSuggested => self.shift_suggested,
        }
    }

    pub fn total(&self) -> usize {
        self.normal + self.good_time + self.shift_suggested
    }
}

/// Total usage over time, in input order.
pub fn total_usage_series(readings: &[Reading]) -> Vec<UsagePoint> {
    readings
        .iter()
        .map(|r| UsagePoint {
            ts: r.ts,
            total_usage: r.total_usage(),
        })
        .collect()
}

/// Mean load per appliance.
pub fn appliance_averages(readings: &[Reading]) -> Option<ApplianceAverages> {
    if readings.is_empty() {
        return None;
    }
    let n = readings.len() as f64;
    let (kitchen, ac, heater) = readings.iter().fold((0.0, 0.0, 0.0), |(k, a, h), r| {
        (k + r.kitchen, a + r.ac, h + r.heater)
    });
    Some(ApplianceAverages {
        kitchen: kitchen / n,
        ac: ac / n,
        heater: heater / n,
    })
}

pub fn day_night_split(readings: &[Reading]) -> DayNightSplit {
    let mut split = DayNightSplit::default();
    for r in readings {
        match r.day_night {
            Some(DayNight::Day) => split.day_watts += r.total_usage(),
            Some(DayNight::Night) => split.night_watts += r.total_usage(),
            None => split.unlabelled += 1,
        }
    }
    split
}

/// The reading with the highest total usage; ties resolve to the earliest row.
pub fn peak_usage(readings: &[Reading]) -> Option<PeakUsage> {
    let mut peak: Option<PeakUsage> = None;
    for (row, r) in readings.iter().enumerate() {
        let total = r.total_usage();
        if peak.map_or(true, |p| total > p.total_usage) {
            peak = Some(PeakUsage {
                row,
                ts: r.ts,
                total_usage: total,
            });
        }
    }
    peak
}

/// Pearson correlation between ambient temperature and total usage.
///
/// `None` with fewer than two readings or when either series is constant.
pub fn temperature_correlation(readings: &[Reading]) -> Option<f64> {
    if readings.len() < 2 {
        return None;
    }
    let n = readings.len() as f64;
    let mean_t = readings.iter().map(|r| r.temp).sum::<f64>() / n;
    let mean_u = readings.iter().map(Reading::total_usage).sum::<f64>() / n;

    let (mut cov, mut var_t, mut var_u) = (0.0, 0.0, 0.0);
    for r in readings {
        let dt = r.temp - mean_t;
        let du = r.total_usage() - mean_u;
        cov += dt * du;
        var_t += dt * dt;
        var_u += du * du;
    }

    let denom = (var_t * var_u).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        None
    } else {
        Some(cov / denom)
    }
}

pub fn label_counts<S>(annotated: &[Annotated<S>]) -> LabelCounts {
    let mut counts = LabelCounts::default();
    for a in annotated {
        counts.record(a.recommendation);
    }
    counts
}
