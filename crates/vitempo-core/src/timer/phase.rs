//! Phase transition policy.
//!
//! Pure functions deciding which phase follows the one that just ended and
//! how the cycle counter moves. The engines call into this module on every
//! expiry or skip; nothing here touches engine state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::settings::Settings;
use crate::technique::TechniqueDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Idle,
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_break(self) -> bool {
        matches!(self, Phase::ShortBreak | Phase::LongBreak)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Phase::Idle => "Ready to Start",
            Phase::Work => "Focus Time",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Work => "work",
            Phase::ShortBreak => "short-break",
            Phase::LongBreak => "long-break",
        };
        f.write_str(s)
    }
}

/// The subset of settings the policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRules {
    pub cycles_before_long_break: u32,
    pub has_long_break: bool,
}

impl PhaseRules {
    /// Long breaks fire only when the technique has them and the cycle
    /// count is non-zero.
    pub fn for_settings(technique: &TechniqueDefinition, settings: &Settings) -> Self {
        Self {
            cycles_before_long_break: settings.cycles_before_long_break,
            has_long_break: technique.has_long_break && settings.cycles_before_long_break > 0,
        }
    }
}

/// Result of closing a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: Phase,
    /// Cycle index after the transition.
    pub cycle_index: u32,
}

/// Phase that follows `current`.
///
/// `cycle_index` is the number of work phases completed in the current
/// counting window, including the one that just ended.
pub fn next_phase(
    current: Phase,
    cycle_index: u32,
    cycles_before_long_break: u32,
    has_long_break: bool,
) -> Phase {
    match current {
        Phase::Work => {
            if has_long_break && cycle_index >= cycles_before_long_break {
                Phase::LongBreak
            } else {
                Phase::ShortBreak
            }
        }
        Phase::ShortBreak | Phase::LongBreak | Phase::Idle => Phase::Work,
    }
}

/// Close `ended` and compute the next phase together with the new cycle index.
///
/// A completed work phase moves the index forward by one before the policy
/// runs. Entering a long break closes the counting window and resets it.
pub fn advance(ended: Phase, cycle_index: u32, rules: PhaseRules) -> Transition {
    let cycle_index = if ended == Phase::Work {
        cycle_index.saturating_add(1)
    } else {
        cycle_index
    };

    let next = next_phase(
        ended,
        cycle_index,
        rules.cycles_before_long_break,
        rules.has_long_break,
    );

    let cycle_index = if next == Phase::LongBreak { 0 } else { cycle_index };
    Transition { next, cycle_index }
}

pub fn should_auto_start(next: Phase, auto_start_breaks: bool, auto_start_work: bool) -> bool {
    match next {
        Phase::Work => auto_start_work,
        Phase::ShortBreak | Phase::LongBreak => auto_start_breaks,
        Phase::Idle => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const POMODORO: PhaseRules = PhaseRules {
        cycles_before_long_break: 4,
        has_long_break: true,
    };

    #[test]
    fn work_goes_to_short_break_before_threshold() {
        assert_eq!(next_phase(Phase::Work, 1, 4, true), Phase::ShortBreak);
        assert_eq!(next_phase(Phase::Work, 3, 4, true), Phase::ShortBreak);
    }

    #[test]
    fn work_goes_to_long_break_at_threshold() {
        assert_eq!(next_phase(Phase::Work, 4, 4, true), Phase::LongBreak);
    }

    #[test]
    fn breaks_go_back_to_work() {
        assert_eq!(next_phase(Phase::ShortBreak, 2, 4, true), Phase::Work);
        assert_eq!(next_phase(Phase::LongBreak, 0, 4, true), Phase::Work);
    }

    #[test]
    fn no_long_break_without_flag() {
        for i in 0..20 {
            assert_eq!(next_phase(Phase::Work, i, 0, false), Phase::ShortBreak);
        }
    }

    #[test]
    fn fourth_work_completion_enters_long_break_and_resets() {
        let mut index = 0;
        let mut seen = Vec::new();
        for _ in 0..4 {
            let t = advance(Phase::Work, index, POMODORO);
            seen.push(t.next);
            index = t.cycle_index;
            index = advance(t.next, index, POMODORO).cycle_index;
        }
        assert_eq!(
            seen,
            vec![Phase::ShortBreak, Phase::ShortBreak, Phase::ShortBreak, Phase::LongBreak]
        );
        assert_eq!(index, 0);
    }

    #[test]
    fn break_completion_keeps_index() {
        let t = advance(Phase::ShortBreak, 2, POMODORO);
        assert_eq!(t, Transition { next: Phase::Work, cycle_index: 2 });
    }

    #[test]
    fn auto_start_follows_the_entered_phase() {
        assert!(should_auto_start(Phase::Work, false, true));
        assert!(!should_auto_start(Phase::Work, true, false));
        assert!(should_auto_start(Phase::LongBreak, true, false));
        assert!(!should_auto_start(Phase::Idle, true, true));
    }

    #[test]
    fn phase_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&Phase::ShortBreak).unwrap(), "\"short-break\"");
        assert_eq!(Phase::LongBreak.to_string(), "long-break");
    }

    fn any_phase() -> impl Strategy<Value = Phase> {
        prop_oneof![
            Just(Phase::Idle),
            Just(Phase::Work),
            Just(Phase::ShortBreak),
            Just(Phase::LongBreak),
        ]
    }

    proptest! {
        #[test]
        fn next_phase_follows_rules(
            phase in any_phase(),
            index in 0u32..64,
            cycles in 0u32..16,
            has_long in any::<bool>(),
        ) {
            let next = next_phase(phase, index, cycles, has_long);
            prop_assert_eq!(next, next_phase(phase, index, cycles, has_long));
            match phase {
                Phase::Work => {
                    let expect_long = has_long && index >= cycles;
                    prop_assert_eq!(next == Phase::LongBreak, expect_long);
                    prop_assert!(next.is_break());
                }
                _ => prop_assert_eq!(next, Phase::Work),
            }
        }

        #[test]
        fn advance_moves_index_by_one_or_resets(
            phase in any_phase(),
            index in 0u32..64,
            cycles in 0u32..16,
            has_long in any::<bool>(),
        ) {
            let rules = PhaseRules { cycles_before_long_break: cycles, has_long_break: has_long };
            let t = advance(phase, index, rules);
            if t.next == Phase::LongBreak {
                prop_assert_eq!(t.cycle_index, 0);
            } else if phase == Phase::Work {
                prop_assert_eq!(t.cycle_index, index + 1);
            } else {
                prop_assert_eq!(t.cycle_index, index);
            }
        }
    }
}
