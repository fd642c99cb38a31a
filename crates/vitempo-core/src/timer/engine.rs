//! Fixed-interval timer engine.
//!
//! Counts each phase down from a preset duration. The engine has no thread
//! of its own: the tick source calls `tick()` once per second while the
//! status is `Running`, and user actions call the other commands.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running
//! Running --expiry/skip--> (Running | Idle) on the next phase
//! any --stop/reset--> Idle (phase Idle)
//! ```

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::phase::{advance, should_auto_start, Phase, PhaseRules, Transition};
use super::{PhaseTimer, TimerStatus, Trigger};
use crate::events::Event;
use crate::notify::{NotificationKind, Notifier};
use crate::settings::Settings;
use crate::technique::TechniqueDefinition;
use crate::time_format::to_seconds;

pub struct TimerEngine {
    technique: TechniqueDefinition,
    settings: Settings,
    rules: PhaseRules,
    status: TimerStatus,
    phase: Phase,
    remaining_secs: u64,
    total_secs: u64,
    cycle_index: u32,
    completed_work_cycles: u32,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("technique", &self.technique.id)
            .field("status", &self.status)
            .field("phase", &self.phase)
            .field("remaining_secs", &self.remaining_secs)
            .field("total_secs", &self.total_secs)
            .field("cycle_index", &self.cycle_index)
            .field("completed_work_cycles", &self.completed_work_cycles)
            .finish_non_exhaustive()
    }
}

impl TimerEngine {
    /// Create an engine in the initial state (`Idle`, phase `Idle`).
    pub fn new(technique: TechniqueDefinition, settings: Settings, notifier: Arc<dyn Notifier>) -> Self {
        let rules = PhaseRules::for_settings(&technique, &settings);
        Self {
            technique,
            settings,
            rules,
            status: TimerStatus::Idle,
            phase: Phase::Idle,
            remaining_secs: 0,
            total_secs: 0,
            cycle_index: 0,
            completed_work_cycles: 0,
            notifier,
        }
    }

    fn duration_secs(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => to_seconds(self.settings.work_duration),
            Phase::ShortBreak => to_seconds(self.settings.short_break_duration),
            Phase::LongBreak => to_seconds(self.settings.long_break_duration),
            Phase::Idle => 0,
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.total_secs = self.duration_secs(phase);
        self.remaining_secs = self.total_secs;
    }

    fn clear(&mut self) {
        self.status = TimerStatus::Idle;
        self.phase = Phase::Idle;
        self.remaining_secs = 0;
        self.total_secs = 0;
        self.cycle_index = 0;
        self.completed_work_cycles = 0;
    }

    /// Close the current phase and move to the next one.
    fn complete_phase(&mut self, trigger: Trigger) -> Vec<Event> {
        let ended = self.phase;
        if ended == Phase::Idle {
            return Vec::new();
        }

        let at = Utc::now();
        if trigger == Trigger::Expiry {
            self.notifier.notify(NotificationKind::Complete);
        }

        let mut events = vec![Event::PhaseComplete { phase: ended, at }];
        // Work always hands over to a break below, so each work phase counts once.
        if ended == Phase::Work {
            self.completed_work_cycles = self.completed_work_cycles.saturating_add(1);
            events.push(Event::WorkCycleCompleted {
                delta: 1,
                total: self.completed_work_cycles,
                at,
            });
        }

        let Transition { next, cycle_index } = advance(ended, self.cycle_index, self.rules);
        self.cycle_index = cycle_index;

        let closes_round = ended == Phase::LongBreak
            || (ended == Phase::ShortBreak && !self.rules.has_long_break);
        if closes_round {
            events.push(Event::SessionComplete { at });
        }

        let auto_started = should_auto_start(
            next,
            self.settings.auto_start_breaks,
            self.settings.auto_start_work,
        );
        self.enter(next);
        self.status = if auto_started {
            TimerStatus::Running
        } else {
            TimerStatus::Idle
        };

        if trigger == Trigger::Skip {
            self.notifier.notify(if next.is_break() {
                NotificationKind::Break
            } else {
                NotificationKind::Start
            });
        }

        info!(
            ?trigger,
            from = %ended,
            to = %next,
            cycle_index = self.cycle_index,
            auto_started,
            "phase transition"
        );
        events.push(Event::PhaseStarted {
            phase: next,
            total_secs: self.total_secs,
            auto_started,
            at,
        });
        events
    }
}

impl PhaseTimer for TimerEngine {
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
        self.remaining_secs
    }

    fn total_secs(&self) -> u64 {
        self.total_secs
    }

    fn cycle_index(&self) -> u32 {
        self.cycle_index
    }

    fn completed_work_cycles(&self) -> u32 {
        self.completed_work_cycles
    }

    /// While idle before the first start, preview the work duration.
    fn display_secs(&self) -> u64 {
        if self.phase == Phase::Idle {
            self.duration_secs(Phase::Work)
        } else {
            self.remaining_secs
        }
    }

    fn start(&mut self) -> Vec<Event> {
        match self.status {
            TimerStatus::Running => Vec::new(),
            TimerStatus::Paused => self.resume(),
            TimerStatus::Idle | TimerStatus::Completed => {
                if self.phase == Phase::Idle {
                    self.enter(Phase::Work);
                }
                self.status = TimerStatus::Running;
                self.notifier.notify(NotificationKind::Start);
                debug!(phase = %self.phase, remaining = self.remaining_secs, "timer started");
                vec![Event::TimerStarted {
                    phase: self.phase,
                    total_secs: self.total_secs,
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
            seconds: self.remaining_secs,
            at: Utc::now(),
        }]
    }

    fn resume(&mut self) -> Vec<Event> {
        if self.status != TimerStatus::Paused {
            return Vec::new();
        }
        self.status = TimerStatus::Running;
        vec![Event::TimerResumed {
            seconds: self.remaining_secs,
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

    fn skip(&mut self) -> Vec<Event> {
        self.complete_phase(Trigger::Skip)
    }

    fn tick(&mut self) -> Vec<Event> {
        if self.status != TimerStatus::Running {
            return Vec::new();
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return self.complete_phase(Trigger::Expiry);
        }
        Vec::new()
    }

    fn update_settings(&mut self, settings: Settings) -> Vec<Event> {
        self.rules = PhaseRules::for_settings(&self.technique, &settings);
        self.settings = settings;
        self.reset()
    }
}
