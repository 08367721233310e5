//! Sample pipeline
//!
//! Maps notes to library files, fetches and decodes them on a worker pool,
//! and turns a scheduled performance into playable voices.

pub mod decode_pool;
pub mod decoder;
pub mod preload;
pub mod resampler;
pub mod sample_map;
pub mod voicing;

pub use decode_pool::{DecodePool, DecodeResult};
pub use decoder::{DecodedPcm, PcmDecoder, SymphoniaDecoder};
pub use preload::{DirectorySource, MemorySource, Preloader, SampleBank, SampleSource};
pub use resampler::Resampler;
pub use sample_map::{preload_manifest, release_file, SampleMapping};
pub use voicing::{render_voices, LayerHint, PedalHint, RenderedPerformance, VoiceHint};
