//! Rendering hints for the playback collaborator
//!
//! Converts trigger plans into concrete voices: which sample to play, how
//! far to detune it, how loud, when to release, and which auxiliary layers
//! (harmonic resonance, key-release noise) go with it.

use super::preload::SampleBank;
use super::sample_map::{release_file, SampleMapping};
use crate::config::HumanizeParams;
use crate::humanize::{Performance, PerformanceRng, PinkNoise, TriggerPlan};
use serde::Serialize;
use tracing::debug;

/// Lowest velocity a voice is rendered at after jitter
const MIN_VOICE_VELOCITY: f64 = 0.01;

/// Release-noise gain floor and velocity slope
const RELEASE_NOISE_BASE: f64 = 0.2;
const RELEASE_NOISE_SLOPE: f64 = 0.3;

/// Keyboard width used for the position gain curve
const KEYBOARD_KEYS: f64 = 88.0;

/// Distance from the listener pitch at which resonance chance reaches zero
const RESONANCE_FALLOFF: f64 = 100.0;

/// Extra sample sounding alongside a voice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerHint {
    pub file: String,
    pub start_time: f64,
    pub gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceHint {
    pub pitch: u8,
    pub start_time: f64,
    pub sample: String,
    pub detune_cents: i32,
    pub gain: f64,

    /// Gain ramps down from here
    pub release_time: f64,

    /// Source is stopped here
    pub stop_time: f64,

    pub harmonic: Option<LayerHint>,
    pub release_noise: Option<LayerHint>,
    pub is_ghost: bool,

    /// False when the sample bank lacks the main sample; the voice is skipped
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PedalHint {
    pub time: f64,
    pub file: String,
    pub gain: f64,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedPerformance {
    pub voices: Vec<VoiceHint>,
    pub pedal: PedalHint,
}

impl RenderedPerformance {
    /// Voices the playback collaborator can actually sound
    pub fn playable(&self) -> impl Iterator<Item = &VoiceHint> {
        self.voices.iter().filter(|v| v.available)
    }
}

/// Build voices for every plan, in scheduled-time order
///
/// Without a bank every sample is assumed present. Velocity jitter uses its
/// own pink noise stream so it is independent of timing noise.
pub fn render_voices(
    performance: &Performance,
    params: &HumanizeParams,
    bank: Option<&SampleBank>,
    rng: &mut PerformanceRng,
) -> RenderedPerformance {
    let mut velocity_noise = PinkNoise::new(&params.pink_noise);
    let has = |file: &str| bank.map_or(true, |b| b.contains(file));

    let voices: Vec<VoiceHint> = performance
        .sorted_by_time()
        .iter()
        .map(|plan| render_voice(plan, params, &mut velocity_noise, rng, &has))
        .collect();

    let pedal_file = if rng.chance(0.5) {
        "pedalD1.wav"
    } else {
        "pedalD2.wav"
    };
    let pedal = PedalHint {
        time: performance.pedal.time,
        file: pedal_file.to_string(),
        gain: params.voicing.pedal_gain,
        available: has(pedal_file),
    };

    let rendered = RenderedPerformance { voices, pedal };
    debug!(
        "Rendered {} voices ({} playable)",
        rendered.voices.len(),
        rendered.playable().count()
    );
    rendered
}

fn render_voice(
    plan: &TriggerPlan,
    params: &HumanizeParams,
    velocity_noise: &mut PinkNoise,
    rng: &mut PerformanceRng,
    has: &dyn Fn(&str) -> bool,
) -> VoiceHint {
    let vp = &params.voicing;
    let mapping = SampleMapping::for_note(plan.pitch, plan.written_velocity);

    let velocity = (plan.velocity + velocity_noise.next(rng) * vp.velocity_jitter_scale)
        .clamp(MIN_VOICE_VELOCITY, 1.0);

    let distance = plan.pitch.abs_diff(vp.listener_pitch) as f64;
    let position_factor = 1.0 - (distance / KEYBOARD_KEYS) * vp.position_attenuation;
    let gain = velocity.powi(2) * position_factor;

    let release_time = plan.scheduled_time + plan.duration;
    let stop_time = release_time + vp.release_tail;

    // Always draw so the stream does not depend on the layer
    let resonance_chance = (1.0 - distance / RESONANCE_FALLOFF) * velocity;
    let resonates = rng.chance(resonance_chance);
    let harmonic_file = mapping.harmonic_file();
    let harmonic = (resonates && mapping.velocity_layer > vp.harmonic_min_layer && has(&harmonic_file))
        .then(|| LayerHint {
            file: harmonic_file,
            start_time: plan.scheduled_time,
            gain: gain * vp.harmonic_gain,
        });

    let release = release_file(plan.pitch);
    let release_noise = has(&release).then(|| LayerHint {
        file: release,
        start_time: release_time,
        gain: RELEASE_NOISE_BASE + velocity * RELEASE_NOISE_SLOPE,
    });

    VoiceHint {
        pitch: plan.pitch,
        start_time: plan.scheduled_time,
        available: has(&mapping.file),
        sample: mapping.file,
        detune_cents: mapping.detune_cents,
        gain,
        release_time,
        stop_time,
        harmonic,
        release_noise,
        is_ghost: plan.is_ghost,
    }
}
