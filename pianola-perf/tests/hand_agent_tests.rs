//! Hand simulation behaviour across long move sequences

use pianola_common::Hand;
use pianola_perf::config::HandParams;
use pianola_perf::humanize::{HandAgent, PerformanceRng};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_fast_repetition_loses_velocity() {
    let mut rng = PerformanceRng::seeded(17);
    let mut hand = HandAgent::new(Hand::Right, 70, HandParams::default());

    let first = hand.move_to(72, 1.00, 0.6, &mut rng);
    let second = hand.move_to(72, 1.02, 0.6, &mut rng);

    assert_eq!(first.velocity_scale, 1.0);
    assert!(second.velocity_scale < 1.0);
    assert!((second.velocity_scale - 0.85).abs() < 1e-12);
    assert_eq!(second.latency, 0.0);
}

#[test]
fn test_slow_repetition_is_not_penalized() {
    let mut rng = PerformanceRng::seeded(17);
    let mut hand = HandAgent::new(Hand::Left, 40, HandParams::default());

    hand.move_to(43, 0.0, 0.5, &mut rng);
    let again = hand.move_to(43, 0.5, 0.5, &mut rng);

    assert_eq!(again.velocity_scale, 1.0);
}

#[test]
fn test_fatigue_bounded_under_random_abuse() {
    let mut sequence = StdRng::seed_from_u64(2024);
    let mut rng = PerformanceRng::seeded(2024);
    let mut hand = HandAgent::new(Hand::Right, 70, HandParams::default());
    let mut time = 0.0;

    for _ in 0..10_000 {
        // Mostly frantic leaps with the occasional rest
        time += if sequence.gen_bool(0.02) {
            sequence.gen_range(0.5..30.0)
        } else {
            sequence.gen_range(0.0..0.05)
        };
        let pitch: u8 = sequence.gen_range(0..=127);
        let velocity: f64 = sequence.gen_range(0.0..=1.0);

        let outcome = hand.move_to(pitch, time, velocity, &mut rng);

        let fatigue = hand.fatigue();
        assert!((0.0..=1.0).contains(&fatigue), "fatigue {}", fatigue);
        assert!((0.0..=1.0).contains(&outcome.mistouch_probability));
        assert!((0.0..=1.0).contains(&outcome.velocity_scale));
        assert!(outcome.latency >= 0.0);
    }
}

#[test]
fn test_sustained_leaps_build_fatigue_and_mistouch() {
    let mut rng = PerformanceRng::seeded(9);
    let mut hand = HandAgent::new(Hand::Right, 70, HandParams::default());

    let first = hand.move_to(100, 0.0, 0.9, &mut rng);
    let mut last = first;
    for i in 1..40 {
        let pitch = if i % 2 == 0 { 100 } else { 60 };
        last = hand.move_to(pitch, i as f64 * 0.05, 0.9, &mut rng);
    }

    assert!(hand.fatigue() > 0.5);
    assert!(last.mistouch_probability > first.mistouch_probability);
}

#[test]
fn test_reset_returns_home() {
    let mut rng = PerformanceRng::seeded(1);
    let mut hand = HandAgent::new(Hand::Left, 40, HandParams::default());
    hand.move_to(20, 0.0, 1.0, &mut rng);

    hand.reset();

    assert_eq!(hand.position(), 40);
    assert_eq!(hand.fatigue(), 0.0);
    assert!(hand.state().strike_history.is_empty());
}
