//! Technique catalog.
//!
//! A technique is an immutable, named configuration: default settings plus
//! the flags that pick the engine (`is_flexible`) and enable long breaks.
//! The built-in catalog can be replaced by a TOML file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ValidationError};
use crate::settings::Settings;
use crate::time_format::minutes_to_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechniqueId {
    #[serde(rename = "pomodoro")]
    Pomodoro,
    #[serde(rename = "52-17")]
    FiftyTwoSeventeen,
    #[serde(rename = "90-minute")]
    NinetyMinute,
    #[serde(rename = "timebox")]
    Timebox,
    #[serde(rename = "10-minute")]
    TenMinute,
    #[serde(rename = "flowtime")]
    Flowtime,
}

impl TechniqueId {
    pub const ALL: [TechniqueId; 6] = [
        TechniqueId::Pomodoro,
        TechniqueId::FiftyTwoSeventeen,
        TechniqueId::NinetyMinute,
        TechniqueId::Timebox,
        TechniqueId::TenMinute,
        TechniqueId::Flowtime,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TechniqueId::Pomodoro => "pomodoro",
            TechniqueId::FiftyTwoSeventeen => "52-17",
            TechniqueId::NinetyMinute => "90-minute",
            TechniqueId::Timebox => "timebox",
            TechniqueId::TenMinute => "10-minute",
            TechniqueId::Flowtime => "flowtime",
        }
    }
}

impl fmt::Display for TechniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TechniqueId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TechniqueId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownTechnique(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueDefinition {
    pub id: TechniqueId,
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub has_long_break: bool,
    #[serde(default)]
    pub has_cycles: bool,
    /// Open-ended work phase with a break derived from work time.
    #[serde(default)]
    pub is_flexible: bool,
    pub default_settings: Settings,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub best_for: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "technique")]
    pub techniques: Vec<TechniqueDefinition>,
}

impl Catalog {
    /// The six techniques shipped with the app.
    pub fn builtin() -> Self {
        let fixed = |work: u64, short: u64| Settings {
            work_duration: minutes_to_ms(work),
            short_break_duration: minutes_to_ms(short),
            long_break_duration: 0,
            cycles_before_long_break: 0,
            ..Settings::default()
        };
        let lines = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            techniques: vec![
                TechniqueDefinition {
                    id: TechniqueId::Pomodoro,
                    name: "Pomodoro Technique".into(),
                    short_name: "Pomodoro".into(),
                    description: "Work in 25-minute focused intervals with short breaks".into(),
                    has_long_break: true,
                    has_cycles: true,
                    is_flexible: false,
                    default_settings: Settings::default(),
                    instructions: lines(&[
                        "Choose a task to work on",
                        "Start the 25-minute timer",
                        "Work with full focus until the timer rings",
                        "Take a 5-minute break",
                        "After 4 pomodoros, take a 15-minute break",
                    ]),
                    best_for: lines(&[
                        "Breaking large tasks into manageable chunks",
                        "Building a sustainable work rhythm",
                    ]),
                },
                TechniqueDefinition {
                    id: TechniqueId::FiftyTwoSeventeen,
                    name: "52/17 Rule".into(),
                    short_name: "52/17".into(),
                    description: "Work for 52 minutes, break for 17 minutes".into(),
                    has_long_break: false,
                    has_cycles: false,
                    is_flexible: false,
                    default_settings: fixed(52, 17),
                    instructions: lines(&[
                        "Start a 52-minute focused work session",
                        "When the timer ends, take a full 17-minute break",
                        "Repeat the cycle as needed",
                    ]),
                    best_for: lines(&["Deep work that requires extended concentration"]),
                },
                TechniqueDefinition {
                    id: TechniqueId::NinetyMinute,
                    name: "90-Minute Focus Sessions".into(),
                    short_name: "90-Min".into(),
                    description: "Deep work blocks aligned with ultradian rhythms".into(),
                    has_long_break: false,
                    has_cycles: false,
                    is_flexible: false,
                    default_settings: fixed(90, 20),
                    instructions: lines(&[
                        "Block out 90 minutes of uninterrupted time",
                        "Take a full 20-minute break to recover",
                        "Limit to 2-3 sessions per day",
                    ]),
                    best_for: lines(&["Deep, cognitively demanding work"]),
                },
                TechniqueDefinition {
                    id: TechniqueId::Timebox,
                    name: "Time-Boxing".into(),
                    short_name: "Time-Box".into(),
                    description: "Allocate fixed time blocks to specific tasks".into(),
                    has_long_break: false,
                    has_cycles: false,
                    is_flexible: false,
                    default_settings: fixed(30, 5),
                    instructions: lines(&[
                        "Set a specific time limit for your task",
                        "Stop when the time is up, regardless of completion",
                        "Take a short break before the next box",
                    ]),
                    best_for: lines(&["Preventing perfectionism and over-work"]),
                },
                TechniqueDefinition {
                    id: TechniqueId::TenMinute,
                    name: "10-Minute Rule".into(),
                    short_name: "10-Min".into(),
                    description: "Start with just 10 minutes to overcome procrastination".into(),
                    has_long_break: false,
                    has_cycles: false,
                    is_flexible: false,
                    default_settings: fixed(10, 5),
                    instructions: lines(&[
                        "Choose a task you've been avoiding",
                        "Commit to just 10 minutes of work",
                        "After 10 minutes, decide: continue or break",
                    ]),
                    best_for: lines(&["Overcoming procrastination"]),
                },
                TechniqueDefinition {
                    id: TechniqueId::Flowtime,
                    name: "Flowtime Technique".into(),
                    short_name: "Flowtime".into(),
                    description: "Work until you naturally need a break, then rest".into(),
                    has_long_break: false,
                    has_cycles: false,
                    is_flexible: true,
                    default_settings: fixed(0, 5),
                    instructions: lines(&[
                        "Start working on your task",
                        "Stop when you notice focus declining",
                        "Take a break proportional to work time (about 5:1)",
                    ]),
                    best_for: lines(&["Creative work requiring flow states"]),
                },
            ],
        }
    }

    /// Parse a catalog from TOML (`[[technique]]` tables).
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let catalog: Catalog =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        if catalog.techniques.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "technique".into(),
                message: "catalog has no techniques".into(),
            });
        }
        Ok(catalog)
    }

    pub fn get(&self, id: TechniqueId) -> Option<&TechniqueDefinition> {
        self.techniques.iter().find(|t| t.id == id)
    }

    /// Like [`Catalog::get`], but reports unknown ids as a validation error.
    pub fn require(&self, id: TechniqueId) -> Result<&TechniqueDefinition, ValidationError> {
        self.get(id)
            .ok_or_else(|| ValidationError::UnknownTechnique(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TechniqueDefinition> {
        self.techniques.iter()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
