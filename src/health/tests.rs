use super::*;
use std::time::Duration;

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value)
}

fn create_test_estimator() -> HealthEstimator {
    HealthEstimator::new(
        Duration::ZERO,
        HeartbeatThresholds::default(),
        QualityPolicy::default(),
    )
}

#[test]
fn test_classification_boundaries() {
    let thresholds = HeartbeatThresholds::default();

    assert_eq!(thresholds.classify(secs(0.0)), HeartbeatStatus::Live);
    assert_eq!(thresholds.classify(secs(0.999)), HeartbeatStatus::Live);
    assert_eq!(thresholds.classify(secs(1.0)), HeartbeatStatus::Delay);
    assert_eq!(thresholds.classify(secs(2.999)), HeartbeatStatus::Delay);
    assert_eq!(thresholds.classify(secs(3.0)), HeartbeatStatus::Error);
    assert_eq!(thresholds.classify(secs(4.999)), HeartbeatStatus::Error);
    assert_eq!(thresholds.classify(secs(5.0)), HeartbeatStatus::Offline);
    assert_eq!(thresholds.classify(secs(3600.0)), HeartbeatStatus::Offline);
}

#[test]
fn test_status_labels() {
    assert_eq!(HeartbeatStatus::Live.to_string(), "LIVE");
    assert_eq!(HeartbeatStatus::Delay.to_string(), "DELAY");
    assert_eq!(HeartbeatStatus::Error.to_string(), "ERROR");
    assert_eq!(HeartbeatStatus::Offline.to_string(), "OFFLINE");
    assert_eq!(HeartbeatStatus::Offline.indicator(), "black");
}

#[test]
fn test_threshold_ordering() {
    assert!(HeartbeatThresholds::default().is_ordered());
    assert!(!HeartbeatThresholds::new(secs(3.0), secs(3.0), secs(5.0)).is_ordered());
    assert!(!HeartbeatThresholds::new(Duration::ZERO, secs(3.0), secs(5.0)).is_ordered());
}

#[test]
fn test_silence_scenario() {
    let mut estimator = create_test_estimator();

    estimator.record_frame(ClockSample::new(Duration::ZERO), 1024);
    let report = estimator.tick(Duration::ZERO);
    assert_eq!(report.status, HeartbeatStatus::Live);
    assert_eq!(report.quality.value(), 100);

    let report = estimator.tick(secs(2.0));
    assert_eq!(report.status, HeartbeatStatus::Delay);
    assert_eq!(report.quality.value(), 95);

    let report = estimator.tick(secs(4.0));
    assert_eq!(report.status, HeartbeatStatus::Error);
    assert_eq!(report.quality.value(), 75);

    let report = estimator.tick(secs(6.0));
    assert_eq!(report.status, HeartbeatStatus::Offline);
    assert_eq!(report.quality.value(), 55);
}

/// Drive the score to zero with five long-gap ticks; returns the time reached
fn collapse(estimator: &mut HealthEstimator) -> Duration {
    for step in 1..=5 {
        estimator.tick(secs(3.0 + step as f64));
    }
    assert_eq!(estimator.quality().value(), 0);
    secs(8.0)
}

#[test]
fn test_recovery_counts_ticks_not_frames() {
    let mut estimator = create_test_estimator();
    let mut now = collapse(&mut estimator);

    // 15 frames in one 500 ms tick period raise the score by one step only
    for _ in 0..15 {
        now += Duration::from_millis(33);
        estimator.record_frame(ClockSample::new(now), 10);
    }
    assert_eq!(estimator.quality().value(), 0);
    assert!(estimator.frame_since_tick());

    now += Duration::from_millis(5);
    let report = estimator.tick(now);
    assert_eq!(report.quality.value(), 5);
    assert!(!estimator.frame_since_tick());
}

#[test]
fn test_recovery_reaches_full_after_twenty_ticks() {
    let mut estimator = create_test_estimator();
    let mut now = collapse(&mut estimator);

    for tick in 1..=20u8 {
        for _ in 0..10 {
            now += Duration::from_millis(50);
            estimator.record_frame(ClockSample::new(now), 10);
        }
        let report = estimator.tick(now);
        assert_eq!(report.quality.value(), tick * 5);
    }
    assert_eq!(estimator.quality().value(), 100);

    now += Duration::from_millis(50);
    estimator.record_frame(ClockSample::new(now), 10);
    assert_eq!(estimator.tick(now).quality.value(), 100);
    assert_eq!(estimator.counters().frames, 201);
}

#[test]
fn test_server_confirmations_latch_once_per_tick() {
    let mut estimator = create_test_estimator();
    let mut now = collapse(&mut estimator);

    for _ in 0..4 {
        now += Duration::from_millis(100);
        estimator.record_server_confirmation(ClockSample::new(now - Duration::from_millis(50)));
    }
    assert_eq!(estimator.quality().value(), 0);

    let report = estimator.tick(now);
    assert_eq!(report.status, HeartbeatStatus::Live);
    assert_eq!(report.quality.value(), 5);
    assert_eq!(estimator.counters().server_confirmations, 4);

    // Nothing arrived since, and the gap is still short: the score holds
    now += Duration::from_millis(500);
    assert_eq!(estimator.tick(now).quality.value(), 5);
}

#[test]
fn test_decay_reaches_zero_after_five_long_gaps() {
    let mut estimator = create_test_estimator();

    let expected = [80, 60, 40, 20, 0];
    for (index, value) in expected.iter().enumerate() {
        let report = estimator.tick(secs(3.5 + index as f64));
        assert_eq!(report.quality.value(), *value);
    }

    let report = estimator.tick(secs(20.0));
    assert_eq!(report.quality.value(), 0);
}

#[test]
fn test_short_gap_floor() {
    let mut estimator = create_test_estimator();

    let mut now = secs(1.1);
    for _ in 0..40 {
        let report = estimator.tick(now);
        assert!(report.quality.value() >= 30);
        now += Duration::from_millis(40);
        if now > secs(3.0) {
            now = secs(3.0);
        }
    }
    assert_eq!(estimator.quality().value(), 30);
}

#[test]
fn test_short_gap_lifts_score_below_floor() {
    let policy = QualityPolicy::default();
    let score = policy.apply(QualityScore::new(10), false, secs(2.0));
    assert_eq!(score.value(), 30);
}

#[test]
fn test_quality_unchanged_inside_live_band() {
    let mut estimator = create_test_estimator();
    estimator.tick(secs(4.0));
    assert_eq!(estimator.quality().value(), 80);

    estimator.record_frame(ClockSample::new(secs(4.2)), 10);
    assert_eq!(estimator.tick(secs(4.4)).quality.value(), 85);

    let report = estimator.tick(secs(4.9));
    assert_eq!(report.status, HeartbeatStatus::Live);
    assert_eq!(report.quality.value(), 85);
}

#[test]
fn test_frame_error_takes_decay_path() {
    let mut estimator = create_test_estimator();

    estimator.record_frame(ClockSample::new(secs(0.2)), 10);
    estimator.tick(secs(0.3));

    estimator.record_frame_error();
    estimator.record_frame_error();
    assert_eq!(estimator.quality().value(), 100);
    assert!(!estimator.frame_since_tick());

    let report = estimator.tick(secs(3.5));
    assert_eq!(report.quality.value(), 80);
    assert_eq!(estimator.last_frame(), ClockSample::new(secs(0.2)));
    assert_eq!(estimator.counters().frame_errors, 2);
}

#[test]
fn test_clock_sample_max_wins() {
    let mut estimator = create_test_estimator();

    estimator.record_frame(ClockSample::new(secs(5.0)), 10);
    estimator.record_server_confirmation(ClockSample::new(secs(3.0)));
    assert_eq!(estimator.last_frame(), ClockSample::new(secs(5.0)));

    estimator.record_server_confirmation(ClockSample::new(secs(6.0)));
    assert_eq!(estimator.last_frame(), ClockSample::new(secs(6.0)));

    estimator.record_frame(ClockSample::new(secs(5.9)), 10);
    assert_eq!(estimator.last_frame(), ClockSample::new(secs(6.0)));
    assert_eq!(estimator.counters().server_confirmations, 2);
    assert_eq!(estimator.counters().frames, 2);
}

#[test]
fn test_clamping_over_mixed_sequence() {
    let mut estimator = create_test_estimator();
    let mut now = Duration::ZERO;
    let mut last_sample = estimator.last_frame();

    // Deterministic pseudo-random walk over every kind of signal
    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
    for _ in 0..2_000 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;

        now += Duration::from_millis(seed % 2_500);
        match seed % 4 {
            0 => estimator.record_frame(ClockSample::new(now), 100),
            1 => estimator.record_frame_error(),
            2 => {
                let age = Duration::from_millis(seed % 4_000);
                estimator.record_server_confirmation(ClockSample::new(now.saturating_sub(age)));
            }
            _ => {
                estimator.tick(now);
            }
        }
        let quality = estimator.quality();

        assert!(quality.value() <= 100);
        assert!(estimator.last_frame() >= last_sample);
        last_sample = estimator.last_frame();
    }
}

#[test]
fn test_quality_score_construction() {
    assert_eq!(QualityScore::new(250).value(), 100);
    assert_eq!(QualityScore::default(), QualityScore::MAX);
    assert_eq!(QualityScore::new(95).raise(10).value(), 100);
    assert_eq!(QualityScore::new(10).lower(20, 0).value(), 0);
    assert_eq!(QualityScore::new(42).to_string(), "42%");
}

#[test]
fn test_status_at_does_not_mutate() {
    let estimator = create_test_estimator();
    assert_eq!(estimator.status_at(secs(3.2)), HeartbeatStatus::Error);
    assert_eq!(estimator.quality().value(), 100);
    assert_eq!(estimator.last_status(), HeartbeatStatus::Live);
    assert_eq!(estimator.counters().ticks, 0);
}
