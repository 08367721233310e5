//! pianola-perf: humanized piano performance engine
//!
//! Turns a quantized score into a timed, human-sounding performance and
//! prepares the samples needed to play it.

pub mod config;
pub mod error;
pub mod humanize;
pub mod samples;

pub use error::{Error, Result};
