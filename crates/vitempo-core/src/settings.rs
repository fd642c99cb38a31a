//! Per-technique timer settings.
//!
//! Durations are stored in milliseconds everywhere. Records are persisted as
//! camelCase JSON, one record per technique, and pass through [`migrate`]
//! on load so older minute-based records keep working.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::technique::TechniqueDefinition;
use crate::time_format::{minutes_to_ms, ms_to_minutes};

/// Raw duration values below this are read as minutes during migration.
pub const LEGACY_MINUTES_THRESHOLD: f64 = 1000.0;

const DURATION_KEYS: [&str; 4] = [
    "workDuration",
    "shortBreakDuration",
    "longBreakDuration",
    "fixedBreakDuration",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub work_duration: u64,
    pub short_break_duration: u64,
    pub long_break_duration: u64,
    /// 0 disables long breaks.
    pub cycles_before_long_break: u32,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_work: bool,
    #[serde(default)]
    pub auto_check_tasks_on_completion: bool,
    /// Work minutes per break minute (flow technique).
    #[serde(default = "default_break_ratio")]
    pub break_ratio: f64,
    #[serde(default)]
    pub use_fixed_break: bool,
    /// Fixed flow break; falls back to `short_break_duration` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_break_duration: Option<u64>,
}

fn default_break_ratio() -> f64 {
    5.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: minutes_to_ms(25),
            short_break_duration: minutes_to_ms(5),
            long_break_duration: minutes_to_ms(15),
            cycles_before_long_break: 4,
            auto_start_breaks: false,
            auto_start_work: false,
            auto_check_tasks_on_completion: false,
            break_ratio: default_break_ratio(),
            use_fixed_break: false,
            fixed_break_duration: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Minutes,
    Count,
}

/// Inclusive bounds for a numeric setting, in the unit users type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingRange {
    pub min: u64,
    pub max: u64,
    pub unit: Unit,
}

impl SettingRange {
    fn contains_ms(&self, ms: u64) -> bool {
        ms >= minutes_to_ms(self.min) && ms <= minutes_to_ms(self.max)
    }

    fn clamp_ms(&self, ms: u64) -> u64 {
        ms.clamp(minutes_to_ms(self.min), minutes_to_ms(self.max))
    }

    fn out_of_range(&self, field: &str, value: String) -> ValidationError {
        let suffix = match self.unit {
            Unit::Minutes => " min",
            Unit::Count => "",
        };
        ValidationError::OutOfRange {
            field: field.to_string(),
            min: format!("{}{suffix}", self.min),
            max: format!("{}{suffix}", self.max),
            value,
        }
    }
}

pub const WORK_DURATION_RANGE: SettingRange = SettingRange { min: 1, max: 180, unit: Unit::Minutes };
pub const SHORT_BREAK_RANGE: SettingRange = SettingRange { min: 1, max: 60, unit: Unit::Minutes };
pub const LONG_BREAK_RANGE: SettingRange = SettingRange { min: 1, max: 60, unit: Unit::Minutes };
pub const FIXED_BREAK_RANGE: SettingRange = SettingRange { min: 1, max: 60, unit: Unit::Minutes };
pub const CYCLES_RANGE: SettingRange = SettingRange { min: 0, max: 10, unit: Unit::Count };
pub const BREAK_RATIO_MIN: f64 = 1.0;
pub const BREAK_RATIO_MAX: f64 = 20.0;

/// Setting keys accepted by [`Settings::set_field`].
pub const SETTING_KEYS: [&str; 10] = [
    "workDuration",
    "shortBreakDuration",
    "longBreakDuration",
    "cyclesBeforeLongBreak",
    "autoStartBreaks",
    "autoStartWork",
    "autoCheckTasksOnCompletion",
    "breakRatio",
    "useFixedBreak",
    "fixedBreakDuration",
];

impl Settings {
    /// Fixed flow break in milliseconds.
    pub fn fixed_break_ms(&self) -> u64 {
        self.fixed_break_duration.unwrap_or(self.short_break_duration)
    }

    fn uses_long_break(&self, technique: &TechniqueDefinition) -> bool {
        technique.has_long_break && self.cycles_before_long_break > 0
    }

    /// Check every field against its range for `technique`.
    ///
    /// Flexible techniques have no fixed work duration, so it is not checked.
    pub fn validate(&self, technique: &TechniqueDefinition) -> Result<(), ValidationError> {
        if !technique.is_flexible && !WORK_DURATION_RANGE.contains_ms(self.work_duration) {
            return Err(WORK_DURATION_RANGE
                .out_of_range("workDuration", ms_to_minutes(self.work_duration).to_string()));
        }
        if !SHORT_BREAK_RANGE.contains_ms(self.short_break_duration) {
            return Err(SHORT_BREAK_RANGE.out_of_range(
                "shortBreakDuration",
                ms_to_minutes(self.short_break_duration).to_string(),
            ));
        }
        if self.uses_long_break(technique) && !LONG_BREAK_RANGE.contains_ms(self.long_break_duration)
        {
            return Err(LONG_BREAK_RANGE.out_of_range(
                "longBreakDuration",
                ms_to_minutes(self.long_break_duration).to_string(),
            ));
        }
        if u64::from(self.cycles_before_long_break) > CYCLES_RANGE.max {
            return Err(CYCLES_RANGE.out_of_range(
                "cyclesBeforeLongBreak",
                self.cycles_before_long_break.to_string(),
            ));
        }
        if !self.break_ratio.is_finite()
            || !(BREAK_RATIO_MIN..=BREAK_RATIO_MAX).contains(&self.break_ratio)
        {
            return Err(ValidationError::OutOfRange {
                field: "breakRatio".into(),
                min: BREAK_RATIO_MIN.to_string(),
                max: BREAK_RATIO_MAX.to_string(),
                value: self.break_ratio.to_string(),
            });
        }
        if let Some(fixed) = self.fixed_break_duration {
            if !FIXED_BREAK_RANGE.contains_ms(fixed) {
                return Err(FIXED_BREAK_RANGE
                    .out_of_range("fixedBreakDuration", ms_to_minutes(fixed).to_string()));
            }
        }
        Ok(())
    }

    /// Copy with every field pulled into its range.
    pub fn clamped(&self, technique: &TechniqueDefinition) -> Settings {
        let mut out = self.clone();
        if !technique.is_flexible {
            out.work_duration = WORK_DURATION_RANGE.clamp_ms(out.work_duration);
        }
        out.short_break_duration = SHORT_BREAK_RANGE.clamp_ms(out.short_break_duration);
        if out.uses_long_break(technique) {
            out.long_break_duration = LONG_BREAK_RANGE.clamp_ms(out.long_break_duration);
        }
        out.cycles_before_long_break = out.cycles_before_long_break.min(CYCLES_RANGE.max as u32);
        out.break_ratio = if out.break_ratio.is_finite() {
            out.break_ratio.clamp(BREAK_RATIO_MIN, BREAK_RATIO_MAX)
        } else {
            default_break_ratio()
        };
        out.fixed_break_duration = out.fixed_break_duration.map(|ms| FIXED_BREAK_RANGE.clamp_ms(ms));
        out
    }

    /// Set one field from user text. Durations are given in minutes.
    ///
    /// Accepts camelCase or snake_case keys. Range checks are left to
    /// [`Settings::validate`].
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), ValidationError> {
        let value = value.trim();
        let minutes = |field: &str| -> Result<u64, ValidationError> {
            value.parse::<u64>().map(minutes_to_ms).map_err(|_| ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("expected whole minutes, got '{value}'"),
            })
        };
        let flag = |field: &str| -> Result<bool, ValidationError> {
            value.parse::<bool>().map_err(|_| ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("expected true or false, got '{value}'"),
            })
        };

        match normalize_key(key).as_str() {
            "workDuration" => self.work_duration = minutes("workDuration")?,
            "shortBreakDuration" => self.short_break_duration = minutes("shortBreakDuration")?,
            "longBreakDuration" => self.long_break_duration = minutes("longBreakDuration")?,
            "cyclesBeforeLongBreak" => {
                self.cycles_before_long_break =
                    value.parse().map_err(|_| ValidationError::InvalidValue {
                        field: "cyclesBeforeLongBreak".into(),
                        message: format!("expected a whole number, got '{value}'"),
                    })?
            }
            "autoStartBreaks" => self.auto_start_breaks = flag("autoStartBreaks")?,
            "autoStartWork" => self.auto_start_work = flag("autoStartWork")?,
            "autoCheckTasksOnCompletion" => {
                self.auto_check_tasks_on_completion = flag("autoCheckTasksOnCompletion")?
            }
            "breakRatio" => {
                self.break_ratio = value
                    .parse::<f64>()
                    .ok()
                    .filter(|r| r.is_finite())
                    .ok_or_else(|| ValidationError::InvalidValue {
                        field: "breakRatio".into(),
                        message: format!("expected a number, got '{value}'"),
                    })?
            }
            "useFixedBreak" => self.use_fixed_break = flag("useFixedBreak")?,
            "fixedBreakDuration" => {
                self.fixed_break_duration = if value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(minutes("fixedBreakDuration")?)
                }
            }
            _ => {
                return Err(ValidationError::UnknownField(format!(
                    "{key} (expected one of: {})",
                    SETTING_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

/// `work_duration` -> `workDuration`; camelCase passes through.
fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' || c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Turn a raw persisted record into canonical settings.
///
/// Fields missing from `raw` come from `defaults`, and so do fields whose
/// value does not fit the schema. Duration values strictly between 0 and
/// [`LEGACY_MINUTES_THRESHOLD`] are taken to be minutes and rewritten to
/// milliseconds; converted values never land below the threshold, so a
/// second pass leaves them untouched. A record that is not an object yields
/// `defaults`.
pub fn migrate(raw: &Value, defaults: &Settings) -> Settings {
    let Some(fields) = raw.as_object() else {
        warn!("settings record is not an object; using defaults");
        return defaults.clone();
    };

    let mut merged = match serde_json::to_value(defaults) {
        Ok(Value::Object(map)) => map,
        _ => return defaults.clone(),
    };
    for (key, value) in fields {
        if value.is_null() {
            continue;
        }
        let previous = merged.insert(key.clone(), canonical_duration(key, value));
        if serde_json::from_value::<Settings>(Value::Object(merged.clone())).is_err() {
            warn!(key = %key, "malformed setting; keeping default");
            match previous {
                Some(previous) => merged.insert(key.clone(), previous),
                None => merged.remove(key),
            };
        }
    }

    match serde_json::from_value(Value::Object(merged)) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "malformed settings record; using defaults");
            defaults.clone()
        }
    }
}

fn canonical_duration(key: &str, value: &Value) -> Value {
    if !DURATION_KEYS.contains(&key) {
        return value.clone();
    }
    let Some(n) = value.as_f64().filter(|n| n.is_finite() && *n >= 0.0) else {
        return value.clone();
    };
    let ms = if n > 0.0 && n < LEGACY_MINUTES_THRESHOLD {
        debug!(key, minutes = n, "converting legacy minute value");
        (n * 60_000.0).round().max(LEGACY_MINUTES_THRESHOLD)
    } else {
        n.round()
    };
    Value::from(ms as u64)
}
