//! Performance humanization
//!
//! Leaves first: `rng` and `pink_noise` supply correlated randomness,
//! `hand_agent` models each hand, `hand_assigner` splits the score between
//! hands, `validation` rejects unplayable chords, and `scheduler` composes
//! them into a timed performance.

pub mod hand_agent;
pub mod hand_assigner;
pub mod pink_noise;
pub mod rng;
pub mod scheduler;
pub mod validation;

pub use hand_agent::{HandAgent, HandState, MoveOutcome};
pub use hand_assigner::assign_hands;
pub use pink_noise::PinkNoise;
pub use rng::PerformanceRng;
pub use scheduler::{PedalEvent, Performance, PerformanceScheduler, TimingOffsets, TriggerPlan};
