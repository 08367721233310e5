//! Sample rate conversion using rubato
//!
//! Decoded samples are converted to the playback rate once, at preload time,
//! so playback never resamples.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

pub struct Resampler;

impl Resampler {
    /// Resample planar audio from `input_rate` to `output_rate`
    ///
    /// Returns a copy when the rates already match.
    pub fn resample(
        planar: &[Vec<f32>],
        input_rate: u32,
        output_rate: u32,
    ) -> Result<Vec<Vec<f32>>> {
        if input_rate == output_rate {
            return Ok(planar.to_vec());
        }
        if input_rate == 0 || output_rate == 0 {
            return Err(Error::Decode(format!(
                "Cannot resample {} Hz to {} Hz",
                input_rate, output_rate
            )));
        }

        let channels = planar.len();
        let input_frames = planar.first().map(|c| c.len()).unwrap_or(0);
        if channels == 0 || input_frames == 0 {
            return Ok(planar.to_vec());
        }

        debug!(
            "Resampling {} frames from {}Hz to {}Hz ({} channels)",
            input_frames, input_rate, output_rate, channels
        );

        // Whole sample as a single chunk
        let mut resampler = FastFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            1.0,
            PolynomialDegree::Septic,
            input_frames,
            channels,
        )
        .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

        resampler
            .process(planar, None)
            .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))
    }
}
