//! Safe bindings for the libopus codec.
//!
//! This crate wraps the native Opus encoder and decoder. It validates
//! parameters before they reach libopus, derives frame geometry from PCM
//! buffer lengths, translates native error codes and guarantees each native
//! codec state is destroyed exactly once.
//!
//! PCM is interleaved signed 16-bit. Every encode or decode call covers
//! exactly one frame of 2.5, 5, 10, 20, 40 or 60 ms.
//!
//! # Example
//!
//! ```ignore
//! use giztoy_opus::{Application, Bitrate, Decoder, Encoder};
//!
//! let encoder = Encoder::new(48000, 2, Application::Audio)?;
//! encoder.set_bitrate(Bitrate::Bits(64000))?;
//!
//! // 20ms of stereo PCM at 48kHz
//! let pcm = vec![0u8; 3840];
//! let mut packet = vec![0u8; 4000];
//! let n = encoder.encode(&pcm, pcm.len(), &mut packet, 4000)?;
//!
//! let decoder = Decoder::new(48000, 2)?;
//! let mut out = vec![0u8; 3840];
//! decoder.decode(Some(&packet[..n]), n, &mut out, 3840)?;
//!
//! // Packet lost: synthesize the missing frame.
//! decoder.decode(None, 0, &mut out, 3840)?;
//! ```

mod ffi;

pub mod config;
pub mod ctl;
pub mod handle;
pub mod params;
pub mod units;

mod decoder;
mod encoder;
mod error;

use std::ffi::CStr;

pub use config::{DecoderConfig, EncoderConfig};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{check, NativeErrorKind, OpusError};
pub use handle::NativeHandle;
pub use params::{Application, Bandwidth, Bitrate, Channels, ForceChannels, SampleRate};
pub use units::{FrameDuration, FrameGeometry};

/// Returns the libopus version string, e.g. `libopus 1.4`.
pub fn version() -> String {
    let ptr = unsafe { ffi::opus_get_version_string() };
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let v = version();
        assert!(v.starts_with("libopus"), "unexpected version: {v}");
    }
}
