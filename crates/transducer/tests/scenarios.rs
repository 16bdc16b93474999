//! Multi-tick scenarios against the default tuning.

use headmouse_common::config::{TuningConfig, TuningMode};
use headmouse_transducer::{OrientationSample, PointerDelta, Transducer};

fn sweep(from: f64, to: f64, steps: usize) -> impl Iterator<Item = f64> {
    (0..=steps).map(move |i| from + (to - from) * i as f64 / steps as f64)
}

#[test]
fn slow_turn_and_return_lands_back_on_start() {
    let mut transducer = Transducer::from_tuning(&TuningConfig::default()).unwrap();
    let mut position: i64 = 0;

    for yaw in sweep(0.0, 20.0, 1000).chain(sweep(20.0, 0.0, 1000)) {
        position += transducer
            .advance(&OrientationSample::yaw_pitch(yaw, 0.0), 0.002)
            .dx as i64;
    }

    // Entering the dead zone drops at most the sub-unit remainder.
    assert!(position.abs() <= 1, "ended {position} units from start");
    assert_eq!(transducer.state().applied_yaw(), 0.0);
}

#[test]
fn jitter_inside_dead_zone_is_silent() {
    let mut transducer = Transducer::from_tuning(&TuningConfig::default()).unwrap();
    let jitter = [0.3, -1.1, 2.4, -2.5, 1.7, 0.0, 2.5, -0.9];
    for (i, yaw) in jitter.iter().cycle().take(400).enumerate() {
        let pitch = jitter[(i + 3) % jitter.len()];
        let out = transducer.advance(&OrientationSample::new(*yaw, pitch, 40.0), 0.002);
        assert_eq!(out, PointerDelta::ZERO);
    }
}

#[test]
fn velocity_mode_accumulates_with_time() {
    let tuning = TuningConfig {
        sensitivity: 200.0,
        dead_zone_yaw_degrees: 20.0,
        max_yaw_degrees: 10_000.0,
        mode: TuningMode::Velocity,
        ..TuningConfig::default()
    };
    let mut transducer = Transducer::from_tuning(&tuning).unwrap();

    // One second of 16ms ticks at 50 degrees: about 30 * 200 = 6000 units.
    let total: i64 = (0..62)
        .map(|_| {
            transducer
                .advance(&OrientationSample::yaw_pitch(50.0, 0.0), 0.016)
                .dx as i64
        })
        .sum();
    assert_eq!(total, 62 * 96);
}

#[test]
fn recenter_mid_turn_prevents_snap_back() {
    let mut transducer = Transducer::from_tuning(&TuningConfig::default()).unwrap();
    for yaw in sweep(0.0, 15.0, 50) {
        transducer.advance(&OrientationSample::yaw_pitch(yaw, 0.0), 0.002);
    }
    assert!(transducer.state().applied_yaw() > 300.0);

    // The source now reports the held pose as neutral.
    transducer.recenter();
    assert_eq!(
        transducer.advance(&OrientationSample::neutral(), 0.002),
        PointerDelta::ZERO
    );
}
