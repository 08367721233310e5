//! Configuration for pianola-perf
//!
//! One TOML bootstrap file holds both the sample pipeline settings and every
//! humanization parameter. Every field has a built-in default, so an empty or
//! missing file yields a fully working configuration.
//!
//! ```toml
//! samples_folder = "/srv/salamander/44.1khz16bit"
//! decode_workers = 4
//!
//! [logging]
//! level = "debug"
//!
//! [humanize.scheduler]
//! silence_threshold = 2.0
//!
//! [humanize.assigner]
//! right_home = 72
//! ```

use crate::error::Result;
use pianola_common::config::{load_toml_or_default, LoggingConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Folder containing the sample WAV files
    ///
    /// If not specified, resolution falls through to environment → OS default
    pub samples_folder: Option<PathBuf>,

    /// Number of parallel decode workers
    pub decode_workers: usize,

    /// Sample rate decoded PCM is converted to (None keeps the source rate)
    pub output_sample_rate: Option<u32>,

    /// Seconds between "begin performance" and the first scheduled note
    pub start_delay: f64,

    pub logging: LoggingConfig,

    pub humanize: HumanizeParams,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            samples_folder: None,
            decode_workers: 4,
            output_sample_rate: Some(44_100),
            start_delay: 0.5,
            logging: LoggingConfig::default(),
            humanize: HumanizeParams::default(),
        }
    }
}

impl PerformanceConfig {
    /// Load from a TOML file; a missing file gives the defaults
    pub fn load(path: &Path) -> Result<Self> {
        Ok(load_toml_or_default(path)?)
    }
}

/// All humanization tunables
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HumanizeParams {
    pub pink_noise: PinkNoiseParams,
    pub hands: HandParams,
    pub assigner: AssignerParams,
    pub limits: LimitParams,
    pub scheduler: SchedulerParams,
    pub voicing: VoicingParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PinkNoiseParams {
    /// Number of Voss-McCartney sub-generators (counter bits)
    pub bits: u32,

    /// Output bound: values stay within [-range, range]
    pub range: f64,
}

impl Default for PinkNoiseParams {
    fn default() -> Self {
        Self { bits: 5, range: 1.0 }
    }
}

/// Physical model shared by both hands
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HandParams {
    /// Fatigue recovered per second of elapsed time
    pub fatigue_recovery_rate: f64,

    /// Exponent applied to jump distance (semitones)
    pub distance_exponent: f64,

    /// Seconds of latency per distance^exponent
    pub latency_coefficient: f64,

    /// Re-striking the same key inside this window (seconds) is penalized
    pub repetition_window: f64,

    /// Velocity multiplier for a repeated strike (hammer not reset)
    pub repetition_penalty: f64,

    /// Fatigue added by a repeated strike
    pub repetition_fatigue: f64,

    /// Velocity above which a strike adds stress
    pub forte_threshold: f64,
    pub forte_stress: f64,

    /// Jump distance (semitones) above which a move adds stress
    pub jump_stress_threshold: u8,
    pub jump_stress: f64,

    /// Upper bound on fatigue, itself capped at 1.0
    pub max_fatigue: f64,

    /// Jump thresholds (semitones) and their mistouch contributions
    pub medium_jump: u8,
    pub medium_jump_mistouch: f64,
    pub large_jump: u8,
    pub large_jump_mistouch: f64,
    pub very_large_jump: u8,
    pub very_large_jump_mistouch: f64,

    /// Mistouch probability per unit of fatigue
    pub fatigue_mistouch: f64,

    /// Fatigue above which velocity control degrades
    pub control_fatigue_threshold: f64,

    /// Largest velocity loss per unit of fatigue once control degrades
    pub control_loss: f64,
}

impl Default for HandParams {
    fn default() -> Self {
        Self {
            fatigue_recovery_rate: 0.05,
            distance_exponent: 1.2,
            latency_coefficient: 0.0005,
            repetition_window: 0.12,
            repetition_penalty: 0.85,
            repetition_fatigue: 0.02,
            forte_threshold: 0.8,
            forte_stress: 0.02,
            jump_stress_threshold: 12,
            jump_stress: 0.03,
            max_fatigue: 1.0,
            medium_jump: 7,
            medium_jump_mistouch: 0.01,
            large_jump: 12,
            large_jump_mistouch: 0.03,
            very_large_jump: 19,
            very_large_jump_mistouch: 0.05,
            fatigue_mistouch: 0.05,
            control_fatigue_threshold: 0.5,
            control_loss: 0.2,
        }
    }
}

/// Home positions and cost model for hand assignment
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssignerParams {
    /// Resting pitch of each hand at the start of a performance
    pub left_home: u8,
    pub right_home: u8,

    /// Pitch dividing the natural registers of the two hands
    pub center_pitch: u8,

    /// Cost per semitone a hand strays onto the other hand's side
    pub region_bias_per_semitone: f64,

    /// Fixed cost of an assignment that crosses the other hand
    pub crossing_penalty: f64,
}

impl Default for AssignerParams {
    fn default() -> Self {
        Self {
            left_home: 40,
            right_home: 70,
            center_pitch: 64,
            region_bias_per_semitone: 0.5,
            crossing_penalty: 24.0,
        }
    }
}

/// Physical playability limits per hand
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitParams {
    pub max_simultaneous_notes: usize,

    /// Widest interval a hand can cover, in semitones
    pub max_span: u8,
}

impl Default for LimitParams {
    fn default() -> Self {
        Self {
            max_simultaneous_notes: 5,
            max_span: 24,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerParams {
    /// Onsets closer than this (seconds) form one group
    pub onset_epsilon: f64,

    /// Seconds of timing offset per unit of shared pink noise
    pub micro_timing_scale: f64,

    /// A gap longer than this (seconds) makes the next note a recovery note
    pub silence_threshold: f64,

    /// Extra delay range for recovery notes (seconds)
    pub recovery_delay_min: f64,
    pub recovery_delay_max: f64,

    /// Velocity factor range for recovery notes
    pub recovery_velocity_min: f64,
    pub recovery_velocity_max: f64,

    /// Delay and mistouch boost when a hand crosses over the other
    pub crossing_delay: f64,
    pub crossing_mistouch_boost: f64,

    /// Chord stagger per position in the group (seconds)
    pub chord_spread_base: f64,
    pub chord_spread_jitter: f64,

    /// Additional stagger per unit of hand fatigue
    pub chord_spread_fatigue: f64,

    /// Ghost note shape
    pub ghost_velocity_ratio: f64,
    pub ghost_velocity_floor: f64,
    pub ghost_duration: f64,
    pub ghost_lead_min: f64,
    pub ghost_lead_max: f64,

    /// Fraction of the main note's velocity lost to a slip
    pub ghost_energy_loss: f64,

    /// Delay of the main note after a slip (seconds)
    pub mistouch_delay: f64,

    /// Replace the simulated mistouch probability with a fixed value
    pub forced_mistouch: Option<f64>,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            onset_epsilon: 0.001,
            micro_timing_scale: 0.008,
            silence_threshold: 2.0,
            recovery_delay_min: 0.01,
            recovery_delay_max: 0.03,
            recovery_velocity_min: 0.9,
            recovery_velocity_max: 1.1,
            crossing_delay: 0.012,
            crossing_mistouch_boost: 0.08,
            chord_spread_base: 0.008,
            chord_spread_jitter: 0.005,
            chord_spread_fatigue: 0.01,
            ghost_velocity_ratio: 0.2,
            ghost_velocity_floor: 0.02,
            ghost_duration: 0.05,
            ghost_lead_min: 0.01,
            ghost_lead_max: 0.025,
            ghost_energy_loss: 0.15,
            mistouch_delay: 0.008,
            forced_mistouch: None,
        }
    }
}

/// Rendering hints handed to the playback collaborator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoicingParams {
    /// Velocity offset per unit of independent pink noise
    pub velocity_jitter_scale: f64,

    /// Pitch treated as the listener's position (loudest)
    pub listener_pitch: u8,

    /// Gain lost at the far ends of the keyboard
    pub position_attenuation: f64,

    /// Velocity above which harmonic resonance samples are preloaded
    pub harmonic_preload_velocity: f64,

    /// Velocity layer above which a harmonic layer may sound
    pub harmonic_min_layer: u8,

    /// Harmonic layer gain relative to the note gain
    pub harmonic_gain: f64,

    /// Seconds a voice keeps sounding after its release point
    pub release_tail: f64,

    pub pedal_gain: f64,
}

impl Default for VoicingParams {
    fn default() -> Self {
        Self {
            velocity_jitter_scale: 0.0005,
            listener_pitch: 69,
            position_attenuation: 0.3,
            harmonic_preload_velocity: 0.6,
            harmonic_min_layer: 8,
            harmonic_gain: 0.15,
            release_tail: 1.0,
            pedal_gain: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_place_left_hand_below_right() {
        let params = HumanizeParams::default();
        assert!(params.assigner.left_home < params.assigner.right_home);
        assert_eq!(params.limits.max_simultaneous_notes, 5);
        assert_eq!(params.limits.max_span, 24);
        assert_eq!(params.scheduler.silence_threshold, 2.0);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: PerformanceConfig = toml::from_str(
            r#"
            decode_workers = 8

            [humanize.scheduler]
            silence_threshold = 3.5

            [humanize.assigner]
            right_home = 72

            [humanize.hands]
            repetition_window = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(config.decode_workers, 8);
        assert_eq!(config.humanize.scheduler.silence_threshold, 3.5);
        assert_eq!(config.humanize.scheduler.onset_epsilon, 0.001);
        assert_eq!(config.humanize.assigner.right_home, 72);
        assert_eq!(config.humanize.assigner.left_home, 40);
        assert_eq!(config.humanize.hands.repetition_window, 0.2);
        assert_eq!(config.humanize.hands.distance_exponent, 1.2);
        assert_eq!(config.logging.level, "info");
    }
}
