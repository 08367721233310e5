//! Physical playability checks
//!
//! Runs before any scheduling. A chord a single hand cannot physically hold
//! (too many notes, or too wide) rejects the whole performance.

use crate::config::LimitParams;
use crate::error::{Error, LimitViolation, Result};
use pianola_common::{Hand, ScoreEvent};
use std::collections::BTreeMap;

/// Group events whose onsets fall in the same `epsilon`-wide bucket
///
/// Groups come back in chronological order; events keep their relative order.
pub fn group_by_onset(events: &[ScoreEvent], epsilon: f64) -> Vec<Vec<ScoreEvent>> {
    let epsilon = if epsilon > 0.0 { epsilon } else { 0.001 };
    let mut groups: BTreeMap<i64, Vec<ScoreEvent>> = BTreeMap::new();

    for event in events {
        let bucket = (event.onset_time / epsilon).round() as i64;
        groups.entry(bucket).or_default().push(event.clone());
    }

    groups.into_values().collect()
}

/// Reject any hand group that breaks the finger-count or span limit
///
/// Expects events already carrying their assigned hand.
pub fn validate_physical_limits(
    events: &[ScoreEvent],
    limits: &LimitParams,
    epsilon: f64,
) -> Result<()> {
    for group in group_by_onset(events, epsilon) {
        let onset = group[0].onset_time;

        for hand in [Hand::Left, Hand::Right] {
            let pitches: Vec<u8> = group
                .iter()
                .filter(|e| e.hand == Some(hand))
                .map(|e| e.pitch)
                .collect();

            if pitches.len() > limits.max_simultaneous_notes {
                return Err(Error::PhysicalLimit {
                    hand,
                    violation: LimitViolation::FingerCount(pitches.len()),
                    onset,
                });
            }

            if let (Some(low), Some(high)) = (pitches.iter().min(), pitches.iter().max()) {
                let span = high - low;
                if span > limits.max_span {
                    return Err(Error::PhysicalLimit {
                        hand,
                        violation: LimitViolation::Span(span),
                        onset,
                    });
                }
            }
        }
    }

    Ok(())
}
