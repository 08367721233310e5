//! In-memory sample decoding using symphonia
//!
//! Decodes encoded sample bytes (WAV, FLAC, MP3, Vorbis) to planar f32 PCM,
//! optionally resampled to the playback rate.

use super::resampler::Resampler;
use crate::error::{Error, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Channel-separated PCM
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPcm {
    /// One sample sequence per channel, all the same length
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl DecodedPcm {
    pub fn frames(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Converts encoded bytes to PCM; called from decode worker threads
pub trait PcmDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedPcm>;
}

/// Symphonia-backed decoder
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder {
    target_rate: Option<u32>,
}

impl SymphoniaDecoder {
    /// `target_rate` of `None` keeps each sample's native rate
    pub fn new(target_rate: Option<u32>) -> Self {
        Self { target_rate }
    }
}

impl PcmDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedPcm> {
        let pcm = decode_bytes(bytes)?;

        match self.target_rate {
            Some(rate) if rate != pcm.sample_rate => Ok(DecodedPcm {
                channels: Resampler::resample(&pcm.channels, pcm.sample_rate, rate)?,
                sample_rate: rate,
            }),
            _ => Ok(pcm),
        }
    }
}

/// Decode a complete encoded buffer
fn decode_bytes(bytes: &[u8]) -> Result<DecodedPcm> {
    let source = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut channels: Vec<Vec<f32>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                warn!("Error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(Error::Decode(format!("Decode failed: {}", e))),
        };

        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }

        let spec = *decoded.spec();
        let channel_count = spec.channels.count();
        if channels.is_empty() {
            channels = vec![Vec::new(); channel_count];
        }

        // Planar copy: channel c occupies [c * frames, (c + 1) * frames)
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_planar_ref(decoded);
        for (channel, samples) in channels.iter_mut().zip(buffer.samples().chunks(frames)) {
            channel.extend_from_slice(samples);
        }
    }

    if channels.first().map_or(true, |c| c.is_empty()) {
        return Err(Error::Decode("No audio frames decoded".to_string()));
    }

    debug!(
        "Decoded {} frames x {} channels at {} Hz",
        channels[0].len(),
        channels.len(),
        sample_rate
    );

    Ok(DecodedPcm {
        channels,
        sample_rate,
    })
}
