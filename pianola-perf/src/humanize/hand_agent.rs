//! Per-hand physical simulation
//!
//! A `HandAgent` owns the live state of one hand for one performance pass:
//! where it is, how tired it is, and when each key was last struck. Each
//! `move_to()` advances that state and reports how the strike deviates from
//! the score.

use super::rng::PerformanceRng;
use crate::config::HandParams;
use pianola_common::Hand;
use std::collections::HashMap;
use tracing::trace;

/// Live state of one hand
#[derive(Debug, Clone, PartialEq)]
pub struct HandState {
    /// Pitch the hand currently rests over
    pub position: u8,

    /// Accumulated tiredness, always within [0, 1]
    pub fatigue: f64,

    /// Performance time (seconds) of the latest move
    pub last_move_time: f64,

    /// Pitch → performance time of its latest strike
    pub strike_history: HashMap<u8, f64>,
}

impl HandState {
    pub fn at_home(home_pitch: u8) -> Self {
        Self {
            position: home_pitch,
            fatigue: 0.0,
            last_move_time: 0.0,
            strike_history: HashMap::new(),
        }
    }
}

/// How one strike deviates from the score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    /// Seconds between intended and actual strike
    pub latency: f64,

    /// Probability of brushing an adjacent key, within [0, 1]
    pub mistouch_probability: f64,

    /// Multiplier applied to the intended velocity
    pub velocity_scale: f64,
}

pub struct HandAgent {
    hand: Hand,
    home_pitch: u8,
    params: HandParams,
    state: HandState,
}

impl HandAgent {
    pub fn new(hand: Hand, home_pitch: u8, params: HandParams) -> Self {
        Self {
            hand,
            home_pitch,
            params,
            state: HandState::at_home(home_pitch),
        }
    }

    pub fn state(&self) -> &HandState {
        &self.state
    }

    pub fn position(&self) -> u8 {
        self.state.position
    }

    pub fn fatigue(&self) -> f64 {
        self.state.fatigue
    }

    /// Back to the home position with no fatigue or history
    pub fn reset(&mut self) {
        self.state = HandState::at_home(self.home_pitch);
    }

    fn fatigue_cap(&self) -> f64 {
        self.params.max_fatigue.clamp(0.0, 1.0)
    }

    /// Strike `pitch` at performance time `time` with intended `velocity`
    pub fn move_to(
        &mut self,
        pitch: u8,
        time: f64,
        velocity: f64,
        rng: &mut PerformanceRng,
    ) -> MoveOutcome {
        let p = &self.params;
        let cap = self.fatigue_cap();

        // Rest since the previous move
        let elapsed = (time - self.state.last_move_time).max(0.0);
        self.state.fatigue =
            (self.state.fatigue - elapsed * p.fatigue_recovery_rate).clamp(0.0, cap);
        self.state.last_move_time = time;

        let distance = pitch.abs_diff(self.state.position);
        self.state.position = pitch;

        let latency = (distance as f64).powf(p.distance_exponent)
            * p.latency_coefficient
            * (1.0 + self.state.fatigue);

        // Hammer not yet reset after a recent strike of the same key
        let mut repetition_scale = 1.0;
        if let Some(&last_strike) = self.state.strike_history.get(&pitch) {
            if time - last_strike < p.repetition_window {
                repetition_scale = p.repetition_penalty.clamp(0.0, 1.0);
                self.state.fatigue += p.repetition_fatigue;
            }
        }
        self.state.strike_history.insert(pitch, time);

        if velocity > p.forte_threshold {
            self.state.fatigue += p.forte_stress;
        }
        if distance > p.jump_stress_threshold {
            self.state.fatigue += p.jump_stress;
        }
        self.state.fatigue = self.state.fatigue.clamp(0.0, cap);
        let fatigue = self.state.fatigue;

        let mut mistouch = fatigue * p.fatigue_mistouch;
        if distance > p.large_jump {
            mistouch += p.large_jump_mistouch;
        } else if distance > p.medium_jump {
            mistouch += p.medium_jump_mistouch;
        }
        if distance > p.very_large_jump {
            mistouch += p.very_large_jump_mistouch;
        }

        let mut velocity_scale = 1.0;
        if fatigue > p.control_fatigue_threshold {
            velocity_scale -= rng.uniform(0.0, fatigue * p.control_loss);
        }
        velocity_scale = (velocity_scale * repetition_scale).clamp(0.0, 1.0);

        trace!(
            "{} move to {} (distance {}): latency={:.4}s fatigue={:.3} scale={:.3}",
            self.hand,
            pitch,
            distance,
            latency,
            fatigue,
            velocity_scale
        );

        MoveOutcome {
            latency,
            mistouch_probability: mistouch.clamp(0.0, 1.0),
            velocity_scale,
        }
    }
}
