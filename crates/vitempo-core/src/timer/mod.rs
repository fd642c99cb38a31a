mod engine;
mod flow;
pub mod phase;
mod ticker;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use engine::TimerEngine;
pub use flow::{break_duration_secs, FlowEngine};
pub use phase::{advance, next_phase, should_auto_start, Phase, PhaseRules, Transition};
pub use ticker::{SessionRunner, DEFAULT_TICK_INTERVAL};

use crate::events::Event;
use crate::notify::Notifier;
use crate::settings::Settings;
use crate::technique::{TechniqueDefinition, TechniqueId};
use crate::time_format::{format_clock, progress_percent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Point-in-time view of a timer, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub technique: TechniqueId,
    pub status: TimerStatus,
    pub phase: Phase,
    pub phase_label: String,
    /// Remaining seconds, or elapsed seconds for an open-ended work phase.
    pub seconds: u64,
    /// 0 for an open-ended work phase.
    pub total_secs: u64,
    pub counts_up: bool,
    pub display: String,
    pub progress_pct: f64,
    pub cycle_index: u32,
    pub completed_work_cycles: u32,
    pub at: DateTime<Utc>,
}

/// Operations shared by the fixed-interval and flow engines.
///
/// Every command returns the events it produced. An empty vector means the
/// command does not apply in the current state and nothing changed.
pub trait PhaseTimer: Send {
    fn technique(&self) -> &TechniqueDefinition;
    fn settings(&self) -> &Settings;
    fn status(&self) -> TimerStatus;
    fn phase(&self) -> Phase;
    /// Remaining seconds, or elapsed seconds while counting up.
    fn seconds(&self) -> u64;
    fn total_secs(&self) -> u64;
    fn cycle_index(&self) -> u32;
    fn completed_work_cycles(&self) -> u32;
    fn counts_up(&self) -> bool {
        false
    }

    /// Seconds shown on the clock; engines may preview the next phase while idle.
    fn display_secs(&self) -> u64 {
        self.seconds()
    }

    fn start(&mut self) -> Vec<Event>;
    fn pause(&mut self) -> Vec<Event>;
    fn resume(&mut self) -> Vec<Event>;
    fn stop(&mut self) -> Vec<Event>;
    fn reset(&mut self) -> Vec<Event>;
    fn skip(&mut self) -> Vec<Event>;
    /// Advance one second. Only has an effect while running.
    fn tick(&mut self) -> Vec<Event>;
    /// Rebind settings; the timer returns to its initial state.
    fn update_settings(&mut self, settings: Settings) -> Vec<Event>;

    fn snapshot(&self) -> TimerSnapshot {
        let seconds = self.seconds();
        let total = self.total_secs();
        let display_secs = self.display_secs();
        TimerSnapshot {
            technique: self.technique().id,
            status: self.status(),
            phase: self.phase(),
            phase_label: self.phase().display_name().to_string(),
            seconds,
            total_secs: total,
            counts_up: self.counts_up(),
            display: format_clock(display_secs, false),
            progress_pct: progress_percent(total.saturating_sub(seconds), total),
            cycle_index: self.cycle_index(),
            completed_work_cycles: self.completed_work_cycles(),
            at: Utc::now(),
        }
    }
}

/// Build the engine matching the technique: flow for flexible techniques,
/// fixed intervals otherwise.
pub fn engine_for(
    technique: TechniqueDefinition,
    settings: Settings,
    notifier: Arc<dyn Notifier>,
) -> Box<dyn PhaseTimer> {
    if technique.is_flexible {
        Box::new(FlowEngine::new(technique, settings, notifier))
    } else {
        Box::new(TimerEngine::new(technique, settings, notifier))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Expiry,
    Skip,
}
