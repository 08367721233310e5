//! # Pianola Common Library
//!
//! Shared code for the Pianola crates including:
//! - Score event types and the structured score parser
//! - Bootstrap configuration loading (TOML) and samples folder resolution
//! - Common error types

pub mod config;
pub mod error;
pub mod score;

pub use error::{Error, Result};
pub use score::{Hand, ScoreEvent};
