use energy_core::Label;

/// How recommendation labels are rendered for people and files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LabelFormat {
    /// `NORMAL`, `GOOD_TIME`, `SHIFT_SUGGESTED`.
    #[default]
    Symbolic,
    /// Short human-readable advice.
    Message,
}

impl LabelFormat {
    pub fn render(&self, label: Label) -> &'static str {
        match self {
            Self::Symbolic => label.as_str(),
            Self::Message => message(label),
        }
    }
}

pub fn message(label: Label) -> &'static str {
    match label {
        Label::Normal => "Usage is normal",
        Label::GoodTime => "Good time to run appliances",
        Label::ShiftSuggested => "Suggest shifting usage to off-peak hours",
    }
}
