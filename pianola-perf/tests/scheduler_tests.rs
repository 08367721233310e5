//! End-to-end scheduling behaviour of a humanized performance

use pianola_common::{Hand, ScoreEvent};
use pianola_perf::config::HumanizeParams;
use pianola_perf::error::{Error, LimitViolation};
use pianola_perf::humanize::{PerformanceRng, PerformanceScheduler};

fn scheduler_with(configure: impl FnOnce(&mut HumanizeParams)) -> PerformanceScheduler {
    let mut params = HumanizeParams::default();
    configure(&mut params);
    PerformanceScheduler::new(params)
}

fn scale(pitches: std::ops::Range<u8>, step: f64) -> Vec<ScoreEvent> {
    pitches
        .enumerate()
        .map(|(i, p)| ScoreEvent::new(p, i as f64 * step, step, 0.6))
        .collect()
}

#[test]
fn test_single_middle_c_plays_promptly_with_right_hand() {
    let scheduler = PerformanceScheduler::new(HumanizeParams::default());
    let score = vec![ScoreEvent::new(60, 0.0, 1.0, 0.7)];

    let performance = scheduler
        .perform(&score, 10.0, PerformanceRng::seeded(42))
        .unwrap();

    let notes: Vec<_> = performance.notes().collect();
    assert_eq!(notes.len(), 1);
    let note = notes[0];
    assert_eq!(note.pitch, 60);
    assert_eq!(note.hand, Hand::Right);
    assert!(note.is_recovery);
    assert!(note.scheduled_time >= 10.0);
    assert!(note.scheduled_time - 10.0 < 0.1, "late by {}", note.scheduled_time - 10.0);
    assert_eq!(performance.pedal.time, 10.0);
}

#[test]
fn test_six_note_cluster_rejected_before_scheduling() {
    let scheduler = PerformanceScheduler::new(HumanizeParams::default());
    let score: Vec<ScoreEvent> = (72..78).map(|p| ScoreEvent::new(p, 1.0, 0.5, 0.5)).collect();

    let err = scheduler
        .perform(&score, 0.0, PerformanceRng::seeded(1))
        .unwrap_err();

    match err {
        Error::PhysicalLimit { hand, violation, onset } => {
            assert_eq!(hand, Hand::Right);
            assert_eq!(violation, LimitViolation::FingerCount(6));
            assert_eq!(onset, 1.0);
        }
        other => panic!("Expected PhysicalLimit, got {:?}", other),
    }
}

#[test]
fn test_prepare_reports_same_violation_as_perform() {
    let scheduler = PerformanceScheduler::new(HumanizeParams::default());
    // Left hand stretched over more than two octaves
    let score = vec![ScoreEvent::new(21, 0.0, 0.5, 0.5), ScoreEvent::new(47, 0.0, 0.5, 0.5)];

    assert!(matches!(
        scheduler.prepare(&score),
        Err(Error::PhysicalLimit { violation: LimitViolation::Span(26), .. })
    ));
}

#[test]
fn test_long_silence_triggers_recovery() {
    let scheduler = scheduler_with(|p| p.scheduler.forced_mistouch = Some(0.0));
    let score = vec![
        ScoreEvent::new(72, 0.0, 0.5, 0.5),
        ScoreEvent::new(74, 0.5, 0.5, 0.5),
        ScoreEvent::new(76, 3.5, 0.5, 0.5),
    ];

    let performance = scheduler
        .perform(&score, 0.0, PerformanceRng::seeded(7))
        .unwrap();
    let plans: Vec<_> = performance.notes().collect();

    assert!(plans[0].is_recovery);
    assert!(!plans[1].is_recovery);
    assert_eq!(plans[1].offsets.recovery_delay, 0.0);

    let recovered = plans[2];
    assert!(recovered.is_recovery);
    assert!(recovered.offsets.recovery_delay >= 0.01);
    assert!(recovered.offsets.recovery_delay < 0.03);

    // Fresh hand, no repetition: only the recovery factor bends velocity
    let factor = recovered.velocity / 0.5;
    assert!((0.9..1.1).contains(&factor), "recovery factor {}", factor);
    assert_eq!(plans[1].velocity, 0.5);
}

/// Assignment costs that push a mid-high note onto the left hand
fn crossing_params(params: &mut HumanizeParams) {
    params.assigner.center_pitch = 100;
    params.assigner.region_bias_per_semitone = 10.0;
    params.assigner.crossing_penalty = 0.0;
}

#[test]
fn test_hand_crossing_adds_delay() {
    let scheduler = scheduler_with(|p| {
        crossing_params(p);
        p.scheduler.forced_mistouch = Some(0.0);
    });
    let score = vec![ScoreEvent::new(80, 0.0, 0.5, 0.5)];

    let performance = scheduler
        .perform(&score, 0.0, PerformanceRng::seeded(13))
        .unwrap();

    let plan = performance.notes().next().unwrap();
    assert_eq!(plan.hand, Hand::Left);
    assert_eq!(plan.offsets.crossing_delay, 0.012);
}

#[test]
fn test_hand_crossing_boosts_mistouch() {
    let scheduler = scheduler_with(|p| {
        crossing_params(p);
        p.scheduler.crossing_mistouch_boost = 1.0;
    });
    let score = vec![ScoreEvent::new(80, 0.0, 0.5, 0.5)];

    for seed in 0..20 {
        let performance = scheduler
            .perform(&score, 0.0, PerformanceRng::seeded(seed))
            .unwrap();
        assert_eq!(performance.ghosts().count(), 1, "seed {}", seed);
    }
}

#[test]
fn test_uncrossed_hands_have_no_crossing_delay() {
    let scheduler = scheduler_with(|p| p.scheduler.forced_mistouch = Some(0.0));
    let score = vec![
        ScoreEvent::new(36, 0.0, 0.5, 0.5),
        ScoreEvent::new(76, 0.0, 0.5, 0.5),
    ];

    let performance = scheduler
        .perform(&score, 0.0, PerformanceRng::seeded(13))
        .unwrap();

    assert!(performance.plans.iter().all(|p| p.offsets.crossing_delay == 0.0));
}

#[test]
fn test_forced_mistouch_adds_earlier_quieter_ghost() {
    let score = vec![ScoreEvent::new(67, 0.0, 0.5, 0.8)];

    let clean = scheduler_with(|p| p.scheduler.forced_mistouch = Some(0.0))
        .perform(&score, 1.0, PerformanceRng::seeded(5))
        .unwrap();
    let slipped = scheduler_with(|p| p.scheduler.forced_mistouch = Some(1.0))
        .perform(&score, 1.0, PerformanceRng::seeded(5))
        .unwrap();

    assert_eq!(clean.ghosts().count(), 0);
    let ghosts: Vec<_> = slipped.ghosts().collect();
    assert_eq!(ghosts.len(), 1);

    let main = slipped.notes().next().unwrap();
    let ghost = ghosts[0];
    assert!(ghost.scheduled_time < main.scheduled_time);
    assert_eq!(ghost.pitch.abs_diff(67), 1);
    assert!(ghost.velocity < main.velocity);

    let unslipped = clean.notes().next().unwrap();
    assert!(main.velocity < unslipped.velocity);
}

#[test]
fn test_nothing_scheduled_before_start() {
    let scheduler = scheduler_with(|p| p.scheduler.forced_mistouch = Some(1.0));
    let score = scale(21..108, 0.01);

    let performance = scheduler
        .perform(&score, 2.0, PerformanceRng::seeded(11))
        .unwrap();

    assert_eq!(performance.notes().count(), score.len());
    assert_eq!(performance.ghosts().count(), score.len());
    assert!(performance.plans.iter().all(|p| p.scheduled_time >= 2.0));
    assert!(performance
        .plans
        .iter()
        .all(|p| (0.0..=1.0).contains(&p.velocity)));
}

#[test]
fn test_different_seeds_differ() {
    let scheduler = PerformanceScheduler::new(HumanizeParams::default());
    let score = scale(48..72, 0.25);

    let a = scheduler.perform(&score, 0.0, PerformanceRng::seeded(1)).unwrap();
    let b = scheduler.perform(&score, 0.0, PerformanceRng::seeded(2)).unwrap();

    let times_a: Vec<f64> = a.notes().map(|p| p.scheduled_time).collect();
    let times_b: Vec<f64> = b.notes().map(|p| p.scheduled_time).collect();
    assert_ne!(times_a, times_b);
}

#[test]
fn test_written_velocity_preserved() {
    let scheduler = scheduler_with(|p| p.scheduler.forced_mistouch = Some(0.0));
    let score = vec![ScoreEvent::new(64, 0.0, 0.5, 0.45)];

    let performance = scheduler
        .perform(&score, 0.0, PerformanceRng::seeded(3))
        .unwrap();

    assert_eq!(performance.plans[0].written_velocity, 0.45);
}
