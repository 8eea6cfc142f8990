//! Timer settings and study-method presets.
//!
//! [`Settings`] is plain data: the phase timer reads durations from it and
//! the adaptive advisor reads `work_minutes`/`adaptive_enabled`. Nothing here
//! is validated implicitly; [`Settings::validate`] is called by the config
//! layer when a value is loaded or changed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Durations and adaptive behavior for the study cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    /// Completed work phases before a long break replaces a short one.
    #[serde(default = "default_cycles_to_long")]
    pub cycles_to_long: u32,
    /// Seconds of sustained inattention before the host should alert.
    /// Not used by the timer itself.
    #[serde(default = "default_attention_threshold_seconds")]
    pub attention_threshold_seconds: u32,
    #[serde(default)]
    pub adaptive_enabled: bool,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_cycles_to_long() -> u32 {
    4
}
fn default_attention_threshold_seconds() -> u32 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            cycles_to_long: default_cycles_to_long(),
            attention_threshold_seconds: default_attention_threshold_seconds(),
            adaptive_enabled: false,
        }
    }
}

impl Settings {
    /// Check that every duration is positive and `cycles_to_long >= 1`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            ("work_minutes", self.work_minutes),
            ("short_break_minutes", self.short_break_minutes),
            ("long_break_minutes", self.long_break_minutes),
            ("cycles_to_long", self.cycles_to_long),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Apply the durations of a preset, keeping the attention settings.
    pub fn apply_method(&mut self, method: StudyMethod) {
        let preset = method.settings();
        self.work_minutes = preset.work_minutes;
        self.short_break_minutes = preset.short_break_minutes;
        self.long_break_minutes = preset.long_break_minutes;
        self.cycles_to_long = preset.cycles_to_long;
    }
}

/// Fixed-interval study techniques offered by the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudyMethod {
    #[serde(rename = "pomodoro")]
    Pomodoro,
    #[serde(rename = "52-17")]
    FiftyTwoSeventeen,
    #[serde(rename = "deep-work-90-20")]
    DeepWork,
}

impl StudyMethod {
    pub const ALL: [StudyMethod; 3] = [
        StudyMethod::Pomodoro,
        StudyMethod::FiftyTwoSeventeen,
        StudyMethod::DeepWork,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            StudyMethod::Pomodoro => "pomodoro",
            StudyMethod::FiftyTwoSeventeen => "52-17",
            StudyMethod::DeepWork => "deep-work-90-20",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StudyMethod::Pomodoro => "Pomodoro",
            StudyMethod::FiftyTwoSeventeen => "52 / 17",
            StudyMethod::DeepWork => "Deep Work (90 / 20)",
        }
    }

    /// Durations for this method. Methods without a distinct long break
    /// reuse the short break length.
    pub fn settings(&self) -> Settings {
        let (work, short, long) = match self {
            StudyMethod::Pomodoro => (25, 5, 15),
            StudyMethod::FiftyTwoSeventeen => (52, 17, 17),
            StudyMethod::DeepWork => (90, 20, 20),
        };
        Settings {
            work_minutes: work,
            short_break_minutes: short,
            long_break_minutes: long,
            cycles_to_long: 4,
            ..Settings::default()
        }
    }
}

impl fmt::Display for StudyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for StudyMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StudyMethod::ALL
            .into_iter()
            .find(|m| m.slug() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "method".to_string(),
                message: format!("unknown study method '{s}'"),
            })
    }
}
