use std::{fmt, str::FromStr};

use time::OffsetDateTime;

/// Coarse day/night tag carried by the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DayNight {
    Day,
    Night,
}

impl DayNight {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Night => "Night",
        }
    }
}

impl fmt::Display for DayNight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown day/night label '{0}'")]
pub struct ParseDayNightError(pub String);

impl FromStr for DayNight {
    type Err = ParseDayNightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("day") {
            Ok(Self::Day)
        } else if trimmed.eq_ignore_ascii_case("night") {
            Ok(Self::Night)
        } else {
            Err(ParseDayNightError(s.to_string()))
        }
    }
}

/// One timestamped observation of household appliance load.
///
/// Loads are in Watts. `total_usage` and `hour` are derived on every call and
/// are never stored alongside the source fields.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub ts: OffsetDateTime,
    pub kitchen: f64,
    pub ac: f64,
    pub heater: f64,
    pub occupancy: f64,
    pub temp: f64,
    pub day_night: Option<DayNight>,
}

impl Reading {
    /// Sum of the three tracked appliance loads.
    pub fn total_usage(&self) -> f64 {
        self.kitchen + self.ac + self.heater
    }

    /// Hour of day (0-23) in the timestamp's own offset.
    pub fn hour(&self) -> u8 {
        self.ts.hour()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn reading() -> Reading {
        Reading {
            ts: datetime!(2024-03-01 07:45:00 +02:00),
            kitchen: 300.0,
            ac: 450.5,
            heater: 0.0,
            occupancy: 1.0,
            temp: 24.0,
            day_night: Some(DayNight::Day),
        }
    }

    #[test]
    fn total_usage_sums_appliances() {
        assert_eq!(reading().total_usage(), 750.5);
    }

    #[test]
    fn total_usage_follows_source_fields() {
        let mut r = reading();
        r.heater = 1000.0;
        assert_eq!(r.total_usage(), 1750.5);
    }

    #[test]
    fn hour_uses_timestamp_offset() {
        assert_eq!(reading().hour(), 7);
    }

    #[test]
    fn day_night_parses_loosely() {
        assert_eq!(" night ".parse::<DayNight>(), Ok(DayNight::Night));
        assert_eq!("Day".parse::<DayNight>(), Ok(DayNight::Day));
        assert!("dusk".parse::<DayNight>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn reading_serializes_rfc3339_timestamp() {
        let json = serde_json::to_value(reading()).unwrap();
        assert_eq!(json["ts"], "2024-03-01T07:45:00+02:00");
        assert_eq!(json["day_night"], "Day");
    }
}
