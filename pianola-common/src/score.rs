//! Score event types and the structured score parser
//!
//! Scores arrive as JSON arrays of note objects:
//!
//! ```json
//! [{ "pitch": 64, "time": 0.0, "duration": 0.8, "velocity": 0.65 }]
//! ```
//!
//! `note` is accepted as an alias for `pitch`, and `velocity` defaults to 0.5.
//! Score text is only ever deserialized, never evaluated.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest MIDI pitch
pub const MAX_PITCH: u8 = 127;

/// Velocity used when a score entry omits it
pub const DEFAULT_VELOCITY: f64 = 0.5;

/// Which hand plays a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hand::Left => write!(f, "left hand"),
            Hand::Right => write!(f, "right hand"),
        }
    }
}

/// One timed note of a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    /// MIDI pitch (0-127)
    pub pitch: u8,

    /// Seconds from performance start
    pub onset_time: f64,

    /// Seconds, strictly positive
    pub duration: f64,

    /// Normalized strike intensity (0.0-1.0)
    pub velocity: f64,

    /// Written once by hand assignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<Hand>,
}

impl ScoreEvent {
    pub fn new(pitch: u8, onset_time: f64, duration: f64, velocity: f64) -> Self {
        Self {
            pitch,
            onset_time,
            duration,
            velocity,
            hand: None,
        }
    }

    /// Check the event against the score input ranges
    pub fn validate(&self, index: usize) -> Result<()> {
        let invalid = |reason: String| Error::InvalidEvent { index, reason };

        if self.pitch > MAX_PITCH {
            return Err(invalid(format!("pitch {} above {}", self.pitch, MAX_PITCH)));
        }
        if !self.onset_time.is_finite() || self.onset_time < 0.0 {
            return Err(invalid(format!("onset time {} must be >= 0", self.onset_time)));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(invalid(format!("duration {} must be > 0", self.duration)));
        }
        if !(0.0..=1.0).contains(&self.velocity) {
            return Err(invalid(format!("velocity {} outside 0.0-1.0", self.velocity)));
        }
        Ok(())
    }
}

/// Wire form of a score entry
#[derive(Debug, Deserialize)]
struct ScoreEntry {
    #[serde(alias = "note")]
    pitch: i64,
    time: f64,
    duration: f64,
    #[serde(default = "default_velocity")]
    velocity: f64,
}

fn default_velocity() -> f64 {
    DEFAULT_VELOCITY
}

/// Parse a JSON score into validated events
///
/// Events keep their input order; any ordering is the scheduler's job.
pub fn parse_score(text: &str) -> Result<Vec<ScoreEvent>> {
    let entries: Vec<ScoreEntry> = serde_json::from_str(text)?;

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let pitch = u8::try_from(entry.pitch)
                .ok()
                .filter(|p| *p <= MAX_PITCH)
                .ok_or_else(|| Error::InvalidEvent {
                    index,
                    reason: format!("pitch {} outside 0-{}", entry.pitch, MAX_PITCH),
                })?;

            let event = ScoreEvent::new(pitch, entry.time, entry.duration, entry.velocity);
            event.validate(index)?;
            Ok(event)
        })
        .collect()
}
