//! Frame, sample and PCM byte-length arithmetic.
//!
//! PCM is always interleaved signed 16-bit, so one sample frame occupies
//! `channels * 2` bytes.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OpusError;

/// Bytes per PCM sample (16-bit).
pub const BYTES_PER_SAMPLE: usize = 2;

/// Samples per channel for a frame of `frame_ms` milliseconds.
pub fn samples_per_channel(frame_ms: f64, sample_rate: u32) -> usize {
    (frame_ms * sample_rate as f64 / 1000.0).round() as usize
}

/// PCM byte length of `samples_per_channel` interleaved samples.
pub fn pcm_byte_length(samples_per_channel: usize, channels: u32) -> usize {
    samples_per_channel * channels as usize * BYTES_PER_SAMPLE
}

/// Frame duration in milliseconds covered by `pcm_bytes` of PCM.
///
/// The result is not checked against the legal durations; see
/// [`FrameDuration::from_pcm_len`].
pub fn frame_size_ms(pcm_bytes: usize, sample_rate: u32, channels: u32) -> f64 {
    let bytes_per_second = sample_rate as f64 * channels as f64 * BYTES_PER_SAMPLE as f64;
    pcm_bytes as f64 * 1000.0 / bytes_per_second
}

/// Views little-endian PCM bytes as samples without copying.
///
/// Returns `None` on big-endian targets or when `bytes` is not aligned for
/// `i16`; callers then fall back to [`read_le_samples`].
pub fn le_samples(bytes: &[u8]) -> Option<&[i16]> {
    if cfg!(target_endian = "big") || bytes.len() % BYTES_PER_SAMPLE != 0 {
        return None;
    }
    // Safety: every bit pattern is a valid i16.
    let (head, samples, tail) = unsafe { bytes.align_to::<i16>() };
    (head.is_empty() && tail.is_empty()).then_some(samples)
}

/// Mutable counterpart of [`le_samples`].
pub fn le_samples_mut(bytes: &mut [u8]) -> Option<&mut [i16]> {
    if cfg!(target_endian = "big") || bytes.len() % BYTES_PER_SAMPLE != 0 {
        return None;
    }
    // Safety: every bit pattern is a valid i16.
    let (head, samples, tail) = unsafe { bytes.align_to_mut::<i16>() };
    (head.is_empty() && tail.is_empty()).then_some(samples)
}

/// Decodes little-endian PCM bytes into `out`. Returns the samples written.
pub fn read_le_samples(bytes: &[u8], out: &mut [i16]) -> usize {
    let mut n = 0;
    for (dst, src) in out.iter_mut().zip(bytes.chunks_exact(BYTES_PER_SAMPLE)) {
        *dst = i16::from_le_bytes([src[0], src[1]]);
        n += 1;
    }
    n
}

/// Encodes samples as little-endian PCM into `out`. Returns the bytes written.
pub fn write_le_samples(samples: &[i16], out: &mut [u8]) -> usize {
    let mut n = 0;
    for (dst, sample) in out.chunks_exact_mut(BYTES_PER_SAMPLE).zip(samples) {
        dst.copy_from_slice(&sample.to_le_bytes());
        n += BYTES_PER_SAMPLE;
    }
    n
}

/// Frame duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameDuration {
    Duration2500us,
    Duration5ms,
    Duration10ms,
    Duration20ms,
    Duration40ms,
    Duration60ms,
}

impl FrameDuration {
    /// All legal durations, shortest first.
    pub const ALL: [FrameDuration; 6] = [
        Self::Duration2500us,
        Self::Duration5ms,
        Self::Duration10ms,
        Self::Duration20ms,
        Self::Duration40ms,
        Self::Duration60ms,
    ];

    /// Returns the duration in tenths of a millisecond.
    const fn tenths(&self) -> u32 {
        match self {
            Self::Duration2500us => 25,
            Self::Duration5ms => 50,
            Self::Duration10ms => 100,
            Self::Duration20ms => 200,
            Self::Duration40ms => 400,
            Self::Duration60ms => 600,
        }
    }

    /// Returns the duration in milliseconds.
    pub fn millis(&self) -> f64 {
        self.tenths() as f64 / 10.0
    }

    /// Returns the duration as a Duration.
    pub fn duration(&self) -> Duration {
        Duration::from_micros(self.tenths() as u64 * 100)
    }

    /// Matches a millisecond value exactly against the legal durations.
    pub fn from_millis(ms: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|fd| fd.millis() == ms)
    }

    /// Samples per channel for this duration at `sample_rate`.
    ///
    /// Exact for every legal sample rate.
    pub fn samples_per_channel(&self, sample_rate: u32) -> usize {
        (sample_rate as usize * self.tenths() as usize) / 10_000
    }

    /// PCM byte length of one frame of this duration.
    pub fn pcm_bytes(&self, sample_rate: u32, channels: u32) -> usize {
        pcm_byte_length(self.samples_per_channel(sample_rate), channels)
    }

    /// Finds the duration whose PCM length is exactly `pcm_bytes`.
    pub fn from_pcm_len(pcm_bytes: usize, sample_rate: u32, channels: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|fd| fd.pcm_bytes(sample_rate, channels) == pcm_bytes)
    }
}

impl fmt::Display for FrameDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duration2500us => write!(f, "2.5ms"),
            Self::Duration5ms => write!(f, "5ms"),
            Self::Duration10ms => write!(f, "10ms"),
            Self::Duration20ms => write!(f, "20ms"),
            Self::Duration40ms => write!(f, "40ms"),
            Self::Duration60ms => write!(f, "60ms"),
        }
    }
}

impl Default for FrameDuration {
    fn default() -> Self {
        Self::Duration20ms
    }
}

impl Serialize for FrameDuration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.millis())
    }
}

impl<'de> Deserialize<'de> for FrameDuration {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        FrameDuration::from_millis(ms).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "opus: frame duration {ms}ms is not one of 2.5, 5, 10, 20, 40, 60"
            ))
        })
    }
}

/// Derived shape of one PCM frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub duration: FrameDuration,
    pub samples_per_channel: usize,
    pub pcm_bytes: usize,
}

impl FrameGeometry {
    /// Geometry of a frame of `duration`.
    pub fn new(duration: FrameDuration, sample_rate: u32, channels: u32) -> Self {
        let samples_per_channel = duration.samples_per_channel(sample_rate);
        Self {
            duration,
            samples_per_channel,
            pcm_bytes: pcm_byte_length(samples_per_channel, channels),
        }
    }

    /// Geometry of the frame `pcm_bytes` long, or `InvalidFrameDuration`.
    pub fn from_pcm_len(
        pcm_bytes: usize,
        sample_rate: u32,
        channels: u32,
    ) -> Result<Self, OpusError> {
        FrameDuration::from_pcm_len(pcm_bytes, sample_rate, channels)
            .map(|fd| Self::new(fd, sample_rate, channels))
            .ok_or(OpusError::InvalidFrameDuration {
                pcm_bytes,
                sample_rate,
                channels,
            })
    }

    /// Total interleaved samples in the frame.
    pub fn total_samples(&self) -> usize {
        self.pcm_bytes / BYTES_PER_SAMPLE
    }
}
