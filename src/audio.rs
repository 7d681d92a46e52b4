//! Decoding of the provider's raw speech payload: base64 text wrapping
//! 16-bit little-endian PCM, one channel, fixed 24 kHz sample rate.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::{Result, StudioError};

/// Sample rate of the provider's TTS output.
pub const TTS_SAMPLE_RATE: u32 = 24_000;

/// Playable mono buffer with samples normalized to [-1.0, 1.0).
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Write the buffer as a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

/// Pure, deterministic decode of a base64 PCM payload. Each 16-bit signed
/// sample is divided by 32768, so 32767 lands just under 1.0 and -32768 at
/// exactly -1.0; the frame count is byte length / 2.
pub fn decode_pcm16(payload: &str) -> Result<AudioBuffer> {
    let bytes = BASE64.decode(payload.trim())?;
    if bytes.len() % 2 != 0 {
        return Err(StudioError::Generation(format!(
            "truncated PCM payload: {} bytes is not a whole number of samples",
            bytes.len()
        )));
    }
    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();
    Ok(AudioBuffer {
        samples,
        sample_rate: TTS_SAMPLE_RATE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_samples(samples: &[i16]) -> String {
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        BASE64.encode(bytes)
    }

    #[test]
    fn frame_count_is_half_the_byte_length() {
        let payload = encode_samples(&[0, 1, -1, 12_000]);
        let buffer = decode_pcm16(&payload).unwrap();
        assert_eq!(buffer.frame_count(), 4);
        assert_eq!(buffer.sample_rate, TTS_SAMPLE_RATE);
    }

    #[test]
    fn extremes_normalize_to_the_expected_range() {
        let payload = encode_samples(&[i16::MAX, i16::MIN, 0]);
        let buffer = decode_pcm16(&payload).unwrap();
        assert!(buffer.samples[0] < 1.0 && buffer.samples[0] > 0.9999);
        assert_eq!(buffer.samples[1], -1.0);
        assert_eq!(buffer.samples[2], 0.0);
    }

    #[test]
    fn decoding_is_deterministic() {
        let payload = encode_samples(&[5, -42, 30_000, -30_000, 7]);
        let first = decode_pcm16(&payload).unwrap();
        let second = decode_pcm16(&payload).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn odd_byte_length_is_rejected() {
        let payload = BASE64.encode([0u8, 1, 2]);
        let err = decode_pcm16(&payload).unwrap_err();
        assert!(matches!(err, StudioError::Generation(_)));
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let err = decode_pcm16("not base64!!").unwrap_err();
        assert!(matches!(err, StudioError::Decode(_)));
    }

    #[test]
    fn duration_follows_the_fixed_sample_rate() {
        let payload = encode_samples(&vec![0i16; TTS_SAMPLE_RATE as usize]);
        let buffer = decode_pcm16(&payload).unwrap();
        assert!((buffer.duration_secs() - 1.0).abs() < f32::EPSILON);
    }
}
