//! Sample library layout
//!
//! The library records four anchor notes per octave (C, D#, F#, A) at 16
//! velocity layers. Every other pitch borrows the nearest anchor and is
//! detuned by one semitone. Auxiliary files cover key-release noise,
//! harmonic resonance and the sustain pedal.

use crate::config::VoicingParams;
use pianola_common::ScoreEvent;
use std::collections::HashSet;

pub const VELOCITY_LAYERS: u8 = 16;

/// Key-release noise files exist for the 88 keys of a standard piano
const RELEASE_KEYS: i16 = 88;

/// Lowest pitch (A0) of the release-noise range, minus one
const RELEASE_PITCH_OFFSET: i16 = 20;

/// Sustain pedal press/release variants
pub const PEDAL_FILES: [&str; 4] = ["pedalD1.wav", "pedalD2.wav", "pedalU1.wav", "pedalU2.wav"];

/// Where a pitch/velocity pair lives in the library
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMapping {
    /// Library file name, e.g. `Ds4v9.wav`
    pub file: String,

    /// Playback detune relative to the anchor recording
    pub detune_cents: i32,

    pub anchor: &'static str,
    pub octave: i8,

    /// 1..=16
    pub velocity_layer: u8,
}

impl SampleMapping {
    pub fn for_note(pitch: u8, velocity: f64) -> Self {
        let mut octave = (pitch / 12) as i8 - 1;
        let (anchor, detune_cents) = match pitch % 12 {
            0 => ("C", 0),
            1 => ("C", 100),
            2 => ("Ds", -100),
            3 => ("Ds", 0),
            4 => ("Ds", 100),
            5 => ("Fs", -100),
            6 => ("Fs", 0),
            7 => ("Fs", 100),
            8 => ("A", -100),
            9 => ("A", 0),
            10 => ("A", 100),
            // B borrows the next octave's C
            _ => {
                octave += 1;
                ("C", -100)
            }
        };

        let velocity_layer = velocity_layer(velocity);

        Self {
            file: format!("{}{}v{}.wav", anchor, octave, velocity_layer),
            detune_cents,
            anchor,
            octave,
            velocity_layer,
        }
    }

    /// Sympathetic resonance recording for this anchor
    pub fn harmonic_file(&self) -> String {
        format!("harmV3{}{}.wav", self.anchor, self.octave)
    }
}

/// Quantize velocity in [0, 1] to a recorded layer
pub fn velocity_layer(velocity: f64) -> u8 {
    let layer = (velocity * VELOCITY_LAYERS as f64).floor();
    layer.clamp(1.0, VELOCITY_LAYERS as f64) as u8
}

/// Key-release noise for `pitch`, clamped to the piano's key range
pub fn release_file(pitch: u8) -> String {
    let key = (pitch as i16 - RELEASE_PITCH_OFFSET).clamp(1, RELEASE_KEYS);
    format!("rel{}.wav", key)
}

/// Every file a score needs, each listed once in first-use order
pub fn preload_manifest(score: &[ScoreEvent], params: &VoicingParams) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    let mut add = |name: String| {
        if seen.insert(name.clone()) {
            files.push(name);
        }
    };

    for event in score {
        let mapping = SampleMapping::for_note(event.pitch, event.velocity);
        add(release_file(event.pitch));
        if event.velocity > params.harmonic_preload_velocity {
            add(mapping.harmonic_file());
        }
        add(mapping.file);
    }

    for pedal in PEDAL_FILES {
        add(pedal.to_string());
    }

    files
}
