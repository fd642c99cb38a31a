use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerSnapshot};

/// Every state change in a session produces an Event.
/// The presentation layer renders them; the task coupling consumes
/// `WorkCycleCompleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        seconds: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        seconds: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// The phase that just ended, by expiry or skip.
    PhaseComplete {
        phase: Phase,
        at: DateTime<Utc>,
    },
    PhaseStarted {
        phase: Phase,
        total_secs: u64,
        auto_started: bool,
        at: DateTime<Utc>,
    },
    /// `total` is the engine's cumulative count; consumers reconcile against it.
    WorkCycleCompleted {
        delta: u32,
        total: u32,
        at: DateTime<Utc>,
    },
    /// A full work/break round closed (long break, or break without long breaks).
    SessionComplete {
        at: DateTime<Utc>,
    },
    TaskProgressed {
        task_id: String,
        title: String,
        completed_cycles: u32,
        estimated_cycles: u32,
        is_complete: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot(TimerSnapshot),
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerResumed { .. } => "timer_resumed",
            Event::TimerStopped { .. } => "timer_stopped",
            Event::TimerReset { .. } => "timer_reset",
            Event::PhaseComplete { .. } => "phase_complete",
            Event::PhaseStarted { .. } => "phase_started",
            Event::WorkCycleCompleted { .. } => "work_cycle_completed",
            Event::SessionComplete { .. } => "session_complete",
            Event::TaskProgressed { .. } => "task_progressed",
            Event::StateSnapshot(_) => "state_snapshot",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_snake_case() {
        let event = Event::PhaseComplete { phase: Phase::ShortBreak, at: Utc::now() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "phase_complete");
        assert_eq!(json["phase"], "short-break");
        assert_eq!(event.kind(), "phase_complete");
    }

    #[test]
    fn work_cycle_event_round_trips() {
        let event = Event::WorkCycleCompleted { delta: 1, total: 3, at: Utc::now() };
        let text = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
    }
}
