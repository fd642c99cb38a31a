//! Open-ended work timer.
//!
//! Work counts up from zero until the user ends it with `skip()`. The break
//! that follows counts down from a length derived from the work time (or a
//! fixed length when configured) and then returns to a fresh work phase.
//! There are no long breaks.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::phase::{advance, Phase, PhaseRules};
use super::{PhaseTimer, TimerStatus, Trigger};
use crate::events::Event;
use crate::notify::{NotificationKind, Notifier};
use crate::settings::Settings;
use crate::technique::TechniqueDefinition;
use crate::time_format::to_seconds;

/// Break length in seconds after `work_secs` of work. Never below 1.
///
/// A ratio that is not a positive finite number is treated as 1.
pub fn break_duration_secs(settings: &Settings, work_secs: u64) -> u64 {
    if settings.use_fixed_break {
        return to_seconds(settings.fixed_break_ms()).max(1);
    }
    let ratio = if settings.break_ratio.is_finite() && settings.break_ratio > 0.0 {
        settings.break_ratio
    } else {
        1.0
    };
    ((work_secs as f64 / ratio).floor() as u64).max(1)
}

pub struct FlowEngine {
    technique: TechniqueDefinition,
    settings: Settings,
    rules: PhaseRules,
    status: TimerStatus,
    phase: Phase,
    /// Elapsed during work, remaining during the break.
    seconds: u64,
    break_total_secs: u64,
    last_work_secs: u64,
    cycle_index: u32,
    completed_work_cycles: u32,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for FlowEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowEngine")
            .field("technique", &self.technique.id)
            .field("status", &self.status)
            .field("phase", &self.phase)
            .field("seconds", &self.seconds)
            .field("last_work_secs", &self.last_work_secs)
            .field("completed_work_cycles", &self.completed_work_cycles)
            .finish_non_exhaustive()
    }
}

impl FlowEngine {
    pub fn new(technique: TechniqueDefinition, settings: Settings, notifier: Arc<dyn Notifier>) -> Self {
        let rules = PhaseRules::for_settings(&technique, &settings);
        Self {
            technique,
            settings,
            rules,
            status: TimerStatus::Idle,
            phase: Phase::Idle,
            seconds: 0,
            break_total_secs: 0,
            last_work_secs: 0,
            cycle_index: 0,
            completed_work_cycles: 0,
            notifier,
        }
    }

    /// Length of the most recently ended work phase.
    pub fn last_work_seconds(&self) -> u64 {
        self.last_work_secs
    }

    fn clear(&mut self) {
        self.status = TimerStatus::Idle;
        self.phase = Phase::Idle;
        self.seconds = 0;
        self.break_total_secs = 0;
        self.last_work_secs = 0;
        self.cycle_index = 0;
        self.completed_work_cycles = 0;
    }

    fn enter_work(&mut self) {
        self.phase = Phase::Work;
        self.seconds = 0;
        self.break_total_secs = 0;
    }

    fn end_work(&mut self) -> Vec<Event> {
        let at = Utc::now();
        let worked = self.seconds;
        self.completed_work_cycles = self.completed_work_cycles.saturating_add(1);
        self.last_work_secs = worked;

        let transition = advance(Phase::Work, self.cycle_index, self.rules);
        self.cycle_index = transition.cycle_index;

        let break_secs = break_duration_secs(&self.settings, worked);
        self.phase = transition.next;
        self.seconds = break_secs;
        self.break_total_secs = break_secs;

        let auto_started = self.settings.auto_start_breaks;
        self.status = if auto_started {
            TimerStatus::Running
        } else {
            TimerStatus::Idle
        };
        self.notifier.notify(NotificationKind::Break);
        info!(worked, break_secs, auto_started, "flow work ended");

        vec![
            Event::PhaseComplete { phase: Phase::Work, at },
            Event::WorkCycleCompleted {
                delta: 1,
                total: self.completed_work_cycles,
                at,
            },
            Event::PhaseStarted {
                phase: self.phase,
                total_secs: break_secs,
                auto_started,
                at,
            },
        ]
    }

    fn finish_break(&mut self, trigger: Trigger) -> Vec<Event> {
        let at = Utc::now();
        let ended = self.phase;
        self.cycle_index = advance(ended, self.cycle_index, self.rules).cycle_index;
        self.enter_work();

        let auto_started = self.settings.auto_start_work;
        self.status = if auto_started {
            TimerStatus::Running
        } else {
            TimerStatus::Idle
        };
        self.notifier.notify(NotificationKind::Start);
        info!(?trigger, auto_started, "flow break ended");

        vec![
            Event::PhaseComplete { phase: ended, at },
            Event::SessionComplete { at },
            Event::PhaseStarted {
                phase: Phase::Work,
                total_secs: 0,
                auto_started,
                at,
            },
        ]
    }
}

impl PhaseTimer for FlowEngine {
    fn technique(&self) -> &TechniqueDefinition {
        &self.technique
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn status(&self) -> TimerStatus {
        self.status
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn seconds(&self) -> u64 {
        self.seconds
    }

    fn total_secs(&self) -> u64 {
        self.break_total_secs
    }

    fn cycle_index(&self) -> u32 {
        self.cycle_index
    }

    fn completed_work_cycles(&self) -> u32 {
        self.completed_work_cycles
    }

    fn counts_up(&self) -> bool {
        self.phase == Phase::Work
    }

    fn start(&mut self) -> Vec<Event> {
        match self.status {
            TimerStatus::Running => Vec::new(),
            TimerStatus::Paused => self.resume(),
            TimerStatus::Idle | TimerStatus::Completed => {
                if self.phase == Phase::Idle {
                    self.enter_work();
                }
                if self.phase == Phase::Work && self.seconds == 0 {
                    self.notifier.notify(NotificationKind::Start);
                }
                self.status = TimerStatus::Running;
                debug!(phase = %self.phase, seconds = self.seconds, "flow timer started");
                vec![Event::TimerStarted {
                    phase: self.phase,
                    total_secs: self.break_total_secs,
                    at: Utc::now(),
                }]
            }
        }
    }

    fn pause(&mut self) -> Vec<Event> {
        if self.status != TimerStatus::Running {
            return Vec::new();
        }
        self.status = TimerStatus::Paused;
        vec![Event::TimerPaused {
            seconds: self.seconds,
            at: Utc::now(),
        }]
    }

    fn resume(&mut self) -> Vec<Event> {
        if self.status != TimerStatus::Paused {
            return Vec::new();
        }
        self.status = TimerStatus::Running;
        vec![Event::TimerResumed {
            seconds: self.seconds,
            at: Utc::now(),
        }]
    }

    fn stop(&mut self) -> Vec<Event> {
        self.clear();
        vec![Event::TimerStopped { at: Utc::now() }]
    }

    fn reset(&mut self) -> Vec<Event> {
        self.clear();
        vec![Event::TimerReset { at: Utc::now() }]
    }

    /// Ends work (entering the break) or cuts the break short.
    fn skip(&mut self) -> Vec<Event> {
        match self.phase {
            Phase::Idle => Vec::new(),
            Phase::Work => self.end_work(),
            Phase::ShortBreak | Phase::LongBreak => self.finish_break(Trigger::Skip),
        }
    }

    fn tick(&mut self) -> Vec<Event> {
        if self.status != TimerStatus::Running {
            return Vec::new();
        }
        match self.phase {
            Phase::Work => {
                self.seconds = self.seconds.saturating_add(1);
                Vec::new()
            }
            Phase::ShortBreak | Phase::LongBreak => {
                self.seconds = self.seconds.saturating_sub(1);
                if self.seconds == 0 {
                    self.finish_break(Trigger::Expiry)
                } else {
                    Vec::new()
                }
            }
            Phase::Idle => Vec::new(),
        }
    }

    fn update_settings(&mut self, settings: Settings) -> Vec<Event> {
        self.rules = PhaseRules::for_settings(&self.technique, &settings);
        self.settings = settings;
        self.reset()
    }
}
