//! Stopping rules, evaluated once after every completed interval.

use crate::pattern::{GlobalLimitType, LimitType, Pattern, WorkoutSettings};
use std::time::Duration;

/// Whether the active pattern ends after the shot that just completed.
///
/// Counters must already include that shot.
pub fn should_end_pattern(
    pattern: &Pattern,
    pattern_shots: u32,
    pattern_elapsed: Duration,
    global_shots: u32,
    settings: &WorkoutSettings,
) -> bool {
    let global_shots_reached = settings.global_limit_type == GlobalLimitType::Shot
        && global_shots >= settings.global_shot_limit;
    let pattern_reached = match pattern.limit_type {
        LimitType::Shot => pattern_shots >= pattern.limit,
        LimitType::Time => pattern_elapsed >= pattern.time_limit(),
    };
    global_shots_reached || pattern_reached
}

/// Whether the global time limit has been reached.
pub fn global_time_reached(settings: &WorkoutSettings, global_elapsed: Duration) -> bool {
    settings.global_limit_type == GlobalLimitType::Time
        && global_elapsed >= settings.global_time_limit()
}

/// Whether the configured global limit, of either kind, has been reached.
pub fn global_limit_reached(
    settings: &WorkoutSettings,
    global_shots: u32,
    global_elapsed: Duration,
) -> bool {
    match settings.global_limit_type {
        GlobalLimitType::All => false,
        GlobalLimitType::Shot => global_shots >= settings.global_shot_limit,
        GlobalLimitType::Time => global_time_reached(settings, global_elapsed),
    }
}

/// Whether running off the end of the run order should start another pass.
pub fn wants_another_pass(
    settings: &WorkoutSettings,
    global_shots: u32,
    global_elapsed: Duration,
) -> bool {
    settings.global_limit_type != GlobalLimitType::All
        && !global_limit_reached(settings, global_shots, global_elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn shots(limit: u32) -> Pattern {
        Pattern {
            limit_type: LimitType::Shot,
            limit,
            ..Default::default()
        }
    }

    fn timed(limit: u32) -> Pattern {
        Pattern {
            limit_type: LimitType::Time,
            limit,
            ..Default::default()
        }
    }

    fn global(kind: GlobalLimitType, shot: u32, time: u32) -> WorkoutSettings {
        WorkoutSettings {
            global_limit_type: kind,
            global_shot_limit: shot,
            global_time_limit: time,
            ..Default::default()
        }
    }

    #[test]
    fn shot_limit_ends_on_the_limit() {
        let all = WorkoutSettings::default();
        assert!(!should_end_pattern(&shots(3), 2, Duration::ZERO, 2, &all));
        assert!(should_end_pattern(&shots(3), 3, Duration::ZERO, 3, &all));
    }

    #[test]
    fn time_limit_ignores_shot_count() {
        let all = WorkoutSettings::default();
        let p = timed(30);
        assert!(!should_end_pattern(&p, 99, Duration::from_secs(29), 99, &all));
        assert!(should_end_pattern(&p, 1, Duration::from_secs(30), 1, &all));
    }

    #[test]
    fn global_shot_limit_ends_any_pattern() {
        let g = global(GlobalLimitType::Shot, 12, 0);
        assert!(should_end_pattern(&shots(100), 1, Duration::ZERO, 12, &g));
        assert!(!should_end_pattern(&shots(100), 1, Duration::ZERO, 11, &g));
    }

    #[test]
    fn global_time_limit_does_not_end_pattern_directly() {
        let g = global(GlobalLimitType::Time, 0, 30);
        assert!(!should_end_pattern(&shots(100), 1, Duration::from_secs(60), 1, &g));
        assert!(global_time_reached(&g, Duration::from_secs(30)));
        assert!(!global_time_reached(&g, Duration::from_millis(29_900)));
    }

    #[test]
    fn passes_repeat_only_under_a_global_limit() {
        let all = WorkoutSettings::default();
        assert!(!wants_another_pass(&all, 0, Duration::ZERO));

        let g = global(GlobalLimitType::Shot, 10, 0);
        assert!(wants_another_pass(&g, 9, Duration::ZERO));
        assert!(!wants_another_pass(&g, 10, Duration::ZERO));

        let t = global(GlobalLimitType::Time, 0, 60);
        assert!(wants_another_pass(&t, 500, Duration::from_secs(59)));
        assert!(!wants_another_pass(&t, 0, Duration::from_secs(60)));
    }

    proptest! {
        #[test]
        fn shot_limited_pattern_ends_exactly_at_k(k in 1u32..50, done in 0u32..60) {
            let all = WorkoutSettings::default();
            let ends = should_end_pattern(&shots(k), done, Duration::ZERO, done, &all);
            prop_assert_eq!(ends, done >= k);
        }

        #[test]
        fn global_limit_all_never_stops(shots in 0u32..10_000, secs in 0u64..100_000) {
            let all = WorkoutSettings::default();
            prop_assert!(!global_limit_reached(&all, shots, Duration::from_secs(secs)));
        }
    }
}
