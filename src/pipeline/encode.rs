//! Chunk encoding and loudness measurement.
//!
//! Normalized f32 samples become the 16-bit little-endian byte stream the
//! external process expects on its stdin. Clamping happens before the
//! conversion so out-of-range floats saturate instead of wrapping.

/// Convert one normalized sample to a 16-bit integer, saturating at the rails.
#[inline]
pub fn sample_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Encode a chunk of normalized samples as s16le bytes.
///
/// The output is always exactly `samples.len() * 2` bytes; the transport
/// layer writes it as a single unit.
pub fn encode_chunk(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        bytes.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
    }
    bytes
}

/// Calculates the Root Mean Square (RMS) of normalized audio samples.
///
/// Returns a value clamped to [0.0, 1.0], where 0.0 is silence and values
/// around 0.1–0.3 are typical speech levels.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let s = sample as f64;
            s * s
        })
        .sum();

    let mean_square = sum_squares / samples.len() as f64;
    (mean_square.sqrt() as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_to_i16_preserves_sign() {
        assert!(sample_to_i16(0.5) > 0);
        assert!(sample_to_i16(-0.5) < 0);
        assert_eq!(sample_to_i16(0.0), 0);
    }

    #[test]
    fn test_sample_to_i16_clamps_without_wraparound() {
        assert_eq!(sample_to_i16(1.0), i16::MAX);
        assert_eq!(sample_to_i16(2.5), i16::MAX, "overflow must saturate");
        assert_eq!(sample_to_i16(-1.0), -i16::MAX);
        assert_eq!(sample_to_i16(-3.0), -i16::MAX, "underflow must saturate");
    }

    #[test]
    fn test_roundtrip_preserves_value_within_quantization() {
        for &value in &[0.0f32, 0.25, -0.25, 0.99, -0.99] {
            let back = sample_to_i16(value) as f32 / i16::MAX as f32;
            assert!(
                (back - value).abs() < 1.0 / i16::MAX as f32 * 2.0,
                "roundtrip of {} gave {}",
                value,
                back
            );
        }
    }

    #[test]
    fn test_encode_chunk_is_little_endian() {
        let bytes = encode_chunk(&[1.0]);
        assert_eq!(bytes, i16::MAX.to_le_bytes().to_vec());
    }

    #[test]
    fn test_encode_chunk_length() {
        let bytes = encode_chunk(&[0.0; 2048]);
        assert_eq!(bytes.len(), 4096);
    }

    #[test]
    fn test_rms_silence_is_zero() {
        assert_eq!(calculate_rms(&[0.0; 512]), 0.0);
        assert_eq!(calculate_rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_full_scale_square_wave_is_one() {
        let samples: Vec<f32> = (0..512).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let rms = calculate_rms(&samples);
        assert!((rms - 1.0).abs() < 1e-6, "got {}", rms);
    }

    #[test]
    fn test_rms_clamped_for_out_of_range_input() {
        let rms = calculate_rms(&[4.0; 64]);
        assert_eq!(rms, 1.0);
    }
}
