//! Performance scheduler
//!
//! Turns a score into a complete, timestamped list of trigger plans. The pass
//! is pure computation: it never sleeps or waits, and dropping the returned
//! `Performance` is all the cancellation a caller needs.
//!
//! Per performance:
//! 1. Assign hands (once, over the whole score)
//! 2. Validate physical limits (fatal, nothing is scheduled on failure)
//! 3. Walk onset groups chronologically, bottom-up within a chord, and let
//!    pink noise, the hand agents and the mistouch model bend each note

use super::hand_agent::HandAgent;
use super::hand_assigner::assign_hands;
use super::pink_noise::PinkNoise;
use super::rng::PerformanceRng;
use super::validation::{group_by_onset, validate_physical_limits};
use crate::config::HumanizeParams;
use crate::error::Result;
use pianola_common::{Hand, ScoreEvent};
use serde::Serialize;
use tracing::{debug, info};

/// Where a note's deviation from the score came from (seconds)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimingOffsets {
    pub micro_timing: f64,
    pub recovery_delay: f64,
    pub hand_latency: f64,
    pub crossing_delay: f64,
    pub chord_spread: f64,
    pub mistouch_delay: f64,
}

/// One note to sound, as the playback collaborator should realize it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerPlan {
    pub pitch: u8,

    /// Absolute playback-clock seconds, never before the performance start
    pub scheduled_time: f64,

    pub velocity: f64,

    /// Velocity as written in the score; selects the recorded sample layer
    pub written_velocity: f64,

    pub duration: f64,
    pub hand: Hand,

    /// Synthesized finger slip onto an adjacent key
    pub is_ghost: bool,

    /// First note after a long silence
    pub is_recovery: bool,

    pub offsets: TimingOffsets,
}

/// Sustain pedal press at the start of the performance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PedalEvent {
    pub time: f64,
}

/// Complete schedule produced by one performance pass
#[derive(Debug, Clone, Serialize)]
pub struct Performance {
    pub start_time: f64,
    pub plans: Vec<TriggerPlan>,
    pub pedal: PedalEvent,
}

impl Performance {
    /// Plans for notes written in the score
    pub fn notes(&self) -> impl Iterator<Item = &TriggerPlan> {
        self.plans.iter().filter(|p| !p.is_ghost)
    }

    pub fn ghosts(&self) -> impl Iterator<Item = &TriggerPlan> {
        self.plans.iter().filter(|p| p.is_ghost)
    }

    /// Plans ordered by scheduled time
    pub fn sorted_by_time(&self) -> Vec<TriggerPlan> {
        let mut plans = self.plans.clone();
        plans.sort_by(|a, b| a.scheduled_time.total_cmp(&b.scheduled_time));
        plans
    }
}

pub struct PerformanceScheduler {
    params: HumanizeParams,
}

impl PerformanceScheduler {
    pub fn new(params: HumanizeParams) -> Self {
        Self { params }
    }

    /// Assign hands and check physical limits without scheduling
    ///
    /// Returns the annotated events in strike order.
    pub fn prepare(&self, score: &[ScoreEvent]) -> Result<Vec<ScoreEvent>> {
        let assigned = assign_hands(score, &self.params.assigner);
        validate_physical_limits(
            &assigned,
            &self.params.limits,
            self.params.scheduler.onset_epsilon,
        )?;
        Ok(assigned)
    }

    /// Begin a performance starting at `start_time` on the playback clock
    ///
    /// Fails only when the score breaks a physical limit, in which case no
    /// plan is produced at all.
    pub fn perform(
        &self,
        score: &[ScoreEvent],
        start_time: f64,
        rng: PerformanceRng,
    ) -> Result<Performance> {
        let assigned = self.prepare(score)?;
        let groups = group_by_onset(&assigned, self.params.scheduler.onset_epsilon);

        debug!(
            "Scheduling {} events in {} onset groups from t={:.3}s",
            assigned.len(),
            groups.len(),
            start_time
        );

        let mut session = PerformanceSession::new(&self.params, start_time, rng);
        for mut group in groups {
            // Bottom-up strike order within a chord
            group.sort_by_key(|e| e.pitch);
            for (index, event) in group.iter().enumerate() {
                session.schedule_event(event, index);
            }
        }

        let performance = session.finish();
        info!(
            "Scheduled {} notes ({} ghost, {} recovery)",
            performance.notes().count(),
            performance.ghosts().count(),
            performance.plans.iter().filter(|p| p.is_recovery).count()
        );
        Ok(performance)
    }
}

/// State for one performance pass; created per call, never shared
struct PerformanceSession<'a> {
    params: &'a HumanizeParams,
    start_time: f64,
    left: HandAgent,
    right: HandAgent,
    timing_noise: PinkNoise,
    rng: PerformanceRng,
    last_event_time: f64,
    first_event: bool,
    plans: Vec<TriggerPlan>,
}

impl<'a> PerformanceSession<'a> {
    fn new(params: &'a HumanizeParams, start_time: f64, rng: PerformanceRng) -> Self {
        Self {
            params,
            start_time,
            left: HandAgent::new(Hand::Left, params.assigner.left_home, params.hands.clone()),
            right: HandAgent::new(Hand::Right, params.assigner.right_home, params.hands.clone()),
            timing_noise: PinkNoise::new(&params.pink_noise),
            rng,
            last_event_time: 0.0,
            first_event: true,
            plans: Vec::new(),
        }
    }

    fn schedule_event(&mut self, event: &ScoreEvent, index_in_group: usize) {
        let params = self.params;
        let sp = &params.scheduler;
        let hand = event.hand.unwrap_or(Hand::Right);
        let mut offsets = TimingOffsets::default();

        // Ensemble-wide breathing shared by every note
        offsets.micro_timing = self.timing_noise.next(&mut self.rng) * sp.micro_timing_scale;

        let gap = event.onset_time - self.last_event_time;
        let is_recovery = self.first_event || gap > sp.silence_threshold;
        let mut recovery_factor = 1.0;
        if is_recovery {
            offsets.recovery_delay = self
                .rng
                .uniform(sp.recovery_delay_min, sp.recovery_delay_max);
            recovery_factor = self
                .rng
                .uniform(sp.recovery_velocity_min, sp.recovery_velocity_max);
            self.first_event = false;
        }

        let (agent, other_position) = match hand {
            Hand::Left => (&mut self.left, self.right.position()),
            Hand::Right => (&mut self.right, self.left.position()),
        };
        let outcome = agent.move_to(event.pitch, event.onset_time, event.velocity, &mut self.rng);
        let new_position = agent.position();
        let fatigue = agent.fatigue();
        offsets.hand_latency = outcome.latency;

        let mut mistouch = outcome.mistouch_probability;
        let crossed = match hand {
            Hand::Left => new_position > other_position,
            Hand::Right => new_position < other_position,
        };
        if crossed {
            offsets.crossing_delay = sp.crossing_delay;
            mistouch += sp.crossing_mistouch_boost;
        }
        if let Some(forced) = sp.forced_mistouch {
            mistouch = forced;
        }

        let jitter = self.rng.uniform(0.0, sp.chord_spread_jitter);
        offsets.chord_spread = index_in_group as f64
            * (sp.chord_spread_base + jitter + fatigue * sp.chord_spread_fatigue);

        let mut velocity =
            (event.velocity * outcome.velocity_scale * recovery_factor).clamp(0.0, 1.0);

        let mut scheduled_time = (self.start_time
            + event.onset_time
            + offsets.micro_timing
            + offsets.recovery_delay
            + offsets.hand_latency
            + offsets.crossing_delay
            + offsets.chord_spread)
            .max(self.start_time);

        if self.rng.chance(mistouch) {
            // The slip lands first and steals some of the intended strike
            offsets.mistouch_delay = sp.mistouch_delay;
            scheduled_time += sp.mistouch_delay;

            let ghost_pitch = adjacent_pitch(event.pitch, self.rng.sign());
            let lead = self.rng.uniform(sp.ghost_lead_min, sp.ghost_lead_max);
            let ghost_velocity = (velocity * sp.ghost_velocity_ratio)
                .max(sp.ghost_velocity_floor)
                .min(1.0);

            debug!(
                "Mistouch: {} slipped onto {} before {} at {:.3}s",
                hand, ghost_pitch, event.pitch, event.onset_time
            );

            self.plans.push(TriggerPlan {
                pitch: ghost_pitch,
                scheduled_time: (scheduled_time - lead).max(self.start_time),
                velocity: ghost_velocity,
                written_velocity: ghost_velocity,
                duration: sp.ghost_duration,
                hand,
                is_ghost: true,
                is_recovery: false,
                offsets: TimingOffsets::default(),
            });

            velocity *= 1.0 - sp.ghost_energy_loss.clamp(0.0, 1.0);
        }

        self.plans.push(TriggerPlan {
            pitch: event.pitch,
            scheduled_time,
            velocity,
            written_velocity: event.velocity,
            duration: event.duration,
            hand,
            is_ghost: false,
            is_recovery,
            offsets,
        });

        self.last_event_time = event.onset_time;
    }

    fn finish(self) -> Performance {
        Performance {
            start_time: self.start_time,
            plans: self.plans,
            pedal: PedalEvent {
                time: self.start_time,
            },
        }
    }
}

/// Neighbouring key in `direction`, turning back at the keyboard edges
fn adjacent_pitch(pitch: u8, direction: i16) -> u8 {
    let candidate = pitch as i16 + direction;
    if (0..=127).contains(&candidate) {
        candidate as u8
    } else {
        (pitch as i16 - direction) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_pitch_turns_at_edges() {
        assert_eq!(adjacent_pitch(60, 1), 61);
        assert_eq!(adjacent_pitch(60, -1), 59);
        assert_eq!(adjacent_pitch(0, -1), 1);
        assert_eq!(adjacent_pitch(127, 1), 126);
    }

    #[test]
    fn test_empty_score_only_pedal() {
        let scheduler = PerformanceScheduler::new(HumanizeParams::default());
        let performance = scheduler
            .perform(&[], 3.0, PerformanceRng::seeded(1))
            .unwrap();
        assert!(performance.plans.is_empty());
        assert_eq!(performance.pedal.time, 3.0);
    }

    #[test]
    fn test_chord_is_staggered_bottom_up() {
        let score = vec![
            ScoreEvent::new(76, 0.0, 0.5, 0.5),
            ScoreEvent::new(72, 0.0, 0.5, 0.5),
            ScoreEvent::new(79, 0.0, 0.5, 0.5),
        ];
        let mut params = HumanizeParams::default();
        params.scheduler.forced_mistouch = Some(0.0);
        let scheduler = PerformanceScheduler::new(params);

        let performance = scheduler
            .perform(&score, 0.0, PerformanceRng::seeded(8))
            .unwrap();

        let pitches: Vec<u8> = performance.plans.iter().map(|p| p.pitch).collect();
        assert_eq!(pitches, vec![72, 76, 79]);
        assert_eq!(performance.plans[0].offsets.chord_spread, 0.0);
        assert!(performance.plans[1].offsets.chord_spread > 0.0);
        assert!(performance.plans[2].offsets.chord_spread > performance.plans[1].offsets.chord_spread);
    }

    #[test]
    fn test_same_seed_same_performance() {
        let score: Vec<ScoreEvent> = (0..50)
            .map(|i| ScoreEvent::new((40 + (i * 7) % 40) as u8, i as f64 * 0.2, 0.3, 0.6))
            .collect();
        let scheduler = PerformanceScheduler::new(HumanizeParams::default());

        let a = scheduler.perform(&score, 0.5, PerformanceRng::seeded(99)).unwrap();
        let b = scheduler.perform(&score, 0.5, PerformanceRng::seeded(99)).unwrap();

        assert_eq!(a.plans, b.plans);
    }
}
