//! Batch hand assignment
//!
//! Walks the score in strike order and gives each note to the hand for which
//! it is cheapest. Cost is the jump from the hand's virtual position plus a
//! penalty for straying into the other hand's register and a large penalty
//! for crossing over the other hand. The virtual positions here are separate
//! from the `HandAgent` state used later during scheduling.

use crate::config::AssignerParams;
use pianola_common::{Hand, ScoreEvent};
use std::cmp::Ordering;

/// Strike order: onset ascending, then pitch ascending
pub fn strike_order(a: &ScoreEvent, b: &ScoreEvent) -> Ordering {
    a.onset_time
        .total_cmp(&b.onset_time)
        .then(a.pitch.cmp(&b.pitch))
}

/// Return the events sorted in strike order with `hand` filled in
///
/// The input is left untouched. Identical input always yields identical output.
pub fn assign_hands(events: &[ScoreEvent], params: &AssignerParams) -> Vec<ScoreEvent> {
    let mut assigned = events.to_vec();
    // Stable sort keeps input order for exact duplicates
    assigned.sort_by(strike_order);

    let mut left = params.left_home;
    let mut right = params.right_home;

    for event in assigned.iter_mut() {
        let left_cost = cost(Hand::Left, event.pitch, left, right, params);
        let right_cost = cost(Hand::Right, event.pitch, right, left, params);

        // Ties go to the left hand
        let hand = if left_cost <= right_cost {
            Hand::Left
        } else {
            Hand::Right
        };

        match hand {
            Hand::Left => left = event.pitch,
            Hand::Right => right = event.pitch,
        }
        event.hand = Some(hand);
    }

    assigned
}

fn cost(hand: Hand, pitch: u8, own: u8, other: u8, params: &AssignerParams) -> f64 {
    let travel = pitch.abs_diff(own) as f64;

    // Distance into the other hand's half of the keyboard
    let wrong_side = match hand {
        Hand::Left => pitch.saturating_sub(params.center_pitch),
        Hand::Right => params.center_pitch.saturating_sub(pitch),
    };
    let region_bias = wrong_side as f64 * params.region_bias_per_semitone;

    let crosses = match hand {
        Hand::Left => pitch > other,
        Hand::Right => pitch < other,
    };
    let crossing_penalty = if crosses { params.crossing_penalty } else { 0.0 };

    travel + region_bias + crossing_penalty
}
