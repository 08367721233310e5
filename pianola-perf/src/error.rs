//! Error types for pianola-perf
//!
//! Only physical-limit validation aborts a performance. Sample fetch and
//! decode failures are contained per sample and surface as `None` results;
//! the variants below exist so the failing component can log and report why.

use pianola_common::Hand;
use std::fmt;
use thiserror::Error;

/// Kind of physical limit a hand group broke
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitViolation {
    /// More simultaneous notes than fingers
    FingerCount(usize),

    /// Interval between lowest and highest note, in semitones
    Span(u8),
}

impl fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitViolation::FingerCount(n) => write!(f, "{} simultaneous notes", n),
            LimitViolation::Span(s) => write!(f, "a span of {} semitones", s),
        }
    }
}

/// Main error type for pianola-perf
#[derive(Error, Debug)]
pub enum Error {
    /// Score is not playable by two human hands
    #[error("Physical limit exceeded: {hand} attempted {violation} at {onset:.3}s")]
    PhysicalLimit {
        hand: Hand,
        violation: LimitViolation,
        onset: f64,
    },

    /// Sample byte source could not be retrieved
    #[error("Sample resource missing: {0}")]
    ResourceMissing(String),

    /// Sample bytes could not be decoded
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Errors from the shared crate (score parsing, config files)
    #[error(transparent)]
    Common(#[from] pianola_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using pianola-perf Error
pub type Result<T> = std::result::Result<T, Error>;
