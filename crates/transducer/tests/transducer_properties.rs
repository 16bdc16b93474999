use headmouse_transducer::axis::AxisConfig;
use headmouse_transducer::{
    advance, Mode, OrientationSample, PointerDelta, Transducer, TransducerConfig, TransducerState,
};
use proptest::prelude::*;

fn config(mode: Mode, y_multiplier: f64) -> TransducerConfig {
    TransducerConfig {
        sensitivity: 25.0,
        y_sensitivity_multiplier: y_multiplier,
        dead_zone_yaw_degrees: 2.5,
        dead_zone_pitch_degrees: 3.0,
        max_yaw_degrees: 28.5,
        max_pitch_degrees: 18.5,
        mode,
        max_elapsed_secs: 0.1,
    }
}

fn any_mode() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::Velocity), Just(Mode::Position)]
}

/// Angles including out-of-range and non-finite readings.
fn any_angle() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -180.0f64..180.0,
        1 => -1.0e6f64..1.0e6,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
    ]
}

fn any_elapsed() -> impl Strategy<Value = f64> {
    prop_oneof![
        6 => 0.0f64..0.05,
        1 => 0.0f64..100.0,
        1 => Just(f64::NAN),
        1 => Just(-1.0),
    ]
}

fn samples() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec((any_angle(), any_angle(), any_elapsed()), 1..200)
}

proptest! {
    #[test]
    fn dead_zone_yields_no_motion_regardless_of_history(
        mode in any_mode(),
        history in samples(),
        yaw in -2.5f64..=2.5,
        pitch in -3.0f64..=3.0,
    ) {
        let config = config(mode, 0.25);
        let mut state = TransducerState::new();
        for (y, p, dt) in history {
            advance(&OrientationSample::yaw_pitch(y, p), dt, &config, &mut state);
        }
        let out = advance(&OrientationSample::yaw_pitch(yaw, pitch), 0.016, &config, &mut state);
        prop_assert_eq!(out, PointerDelta::ZERO);
    }

    #[test]
    fn every_step_is_bounded(mode in any_mode(), history in samples()) {
        let config = config(mode, 0.25);
        let yaw_bound = (25.0f64 * (28.5 - 2.5)).round() as i32;
        let pitch_bound = (25.0f64 * 0.25 * (18.5 - 3.0)).round() as i32;
        let mut state = TransducerState::new();
        for (y, p, dt) in history {
            let out = advance(&OrientationSample::yaw_pitch(y, p), dt, &config, &mut state);
            prop_assert!(out.dx.abs() <= yaw_bound, "dx {} exceeds {}", out.dx, yaw_bound);
            prop_assert!(out.dy.abs() <= pitch_bound, "dy {} exceeds {}", out.dy, pitch_bound);
        }
    }

    #[test]
    fn steady_hold_converges_without_drift(yaw in -60.0f64..60.0, ticks in 1usize..500) {
        let config = config(Mode::Position, 0.0);
        let mut state = TransducerState::new();
        let sample = OrientationSample::yaw_pitch(yaw, 0.0);

        let total: i64 = (0..ticks)
            .map(|_| advance(&sample, 0.001, &config, &mut state).dx as i64)
            .sum();

        let expected = config.yaw_axis().desired(yaw).round() as i64;
        prop_assert!((total - expected).abs() <= 1, "total {} expected {}", total, expected);
    }

    #[test]
    fn remainder_never_leaks_a_whole_unit(path in prop::collection::vec(-30.0f64..30.0, 1..300)) {
        let config = config(Mode::Position, 0.25);
        let yaw_axis: AxisConfig = config.yaw_axis();
        let mut state = TransducerState::new();
        let mut previous = 0.0f64;
        for yaw in path {
            // Keep per-tick motion under the step bound so no step is rate limited.
            let yaw = previous + (yaw - previous).clamp(-10.0, 10.0);
            previous = yaw;
            advance(&OrientationSample::yaw_pitch(yaw, 0.0), 0.001, &config, &mut state);
            let remainder = yaw_axis.desired(yaw) - state.applied_yaw();
            prop_assert!(remainder.abs() <= 0.5 + 1e-9, "remainder {}", remainder);
        }
    }

    #[test]
    fn position_is_idempotent_once_converged(yaw in -40.0f64..40.0, pitch in -25.0f64..25.0) {
        let config = config(Mode::Position, 0.25);
        let mut state = TransducerState::new();
        let sample = OrientationSample::yaw_pitch(yaw, pitch);
        advance(&sample, 0.01, &config, &mut state);
        for _ in 0..10 {
            prop_assert_eq!(advance(&sample, 0.01, &config, &mut state), PointerDelta::ZERO);
        }
    }

    #[test]
    fn recenter_then_neutral_is_still(history in samples()) {
        let mut transducer = Transducer::new(config(Mode::Position, 0.25)).unwrap();
        for (y, p, dt) in history {
            transducer.advance(&OrientationSample::yaw_pitch(y, p), dt);
        }
        transducer.recenter();
        prop_assert_eq!(
            transducer.advance(&OrientationSample::neutral(), 0.01),
            PointerDelta::ZERO
        );
    }

    #[test]
    fn mirrored_history_emits_mirrored_motion(mode in any_mode(), history in samples()) {
        let config = config(mode, 0.25);
        let mut right = TransducerState::new();
        let mut left = TransducerState::new();
        for (y, p, dt) in history {
            let r = advance(&OrientationSample::yaw_pitch(y, p), dt, &config, &mut right);
            let l = advance(&OrientationSample::yaw_pitch(-y, -p), dt, &config, &mut left);
            prop_assert_eq!(r.dx, -l.dx, "yaw {}", y);
            prop_assert_eq!(r.dy, -l.dy, "pitch {}", p);
        }
    }

    #[test]
    fn advance_is_deterministic(mode in any_mode(), history in samples()) {
        let config = config(mode, 0.25);
        let mut a = TransducerState::new();
        let mut b = TransducerState::new();
        for (y, p, dt) in history {
            let sample = OrientationSample::yaw_pitch(y, p);
            prop_assert_eq!(
                advance(&sample, dt, &config, &mut a),
                advance(&sample, dt, &config, &mut b)
            );
        }
        prop_assert_eq!(a, b);
    }
}
