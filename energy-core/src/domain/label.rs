use std::{fmt, str::FromStr};

/// Outcome of classifying a single reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Label {
    /// Usage at or below the high-usage threshold.
    Normal,
    /// High usage inside the off-peak window.
    GoodTime,
    /// High usage outside the off-peak window.
    ShiftSuggested,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Normal, Label::GoodTime, Label::ShiftSuggested];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::GoodTime => "GOOD_TIME",
            Self::ShiftSuggested => "SHIFT_SUGGESTED",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown recommendation label '{0}'")]
pub struct ParseLabelError(pub String);

impl FromStr for Label {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::ALL
            .into_iter()
            .find(|l| l.as_str() == s.trim())
            .ok_or_else(|| ParseLabelError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_names_round_trip_through_from_str() {
        for label in Label::ALL {
            assert_eq!(label.to_string().parse::<Label>(), Ok(label));
        }
        assert!("good_time".parse::<Label>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn label_serializes_as_symbolic_name() {
        let json = serde_json::to_string(&Label::ShiftSuggested).unwrap();
        assert_eq!(json, "\"SHIFT_SUGGESTED\"");
    }
}
