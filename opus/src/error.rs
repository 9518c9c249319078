//! Error types and native return-code translation.

use std::fmt;

use thiserror::Error;

use crate::ffi;

/// Classification of a negative libopus return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeErrorKind {
    /// One or more invalid/out of range arguments.
    BadArgument,
    /// Not enough bytes allocated in the buffer.
    BufferTooSmall,
    /// An internal error was detected.
    InternalError,
    /// The compressed data passed is corrupted.
    InvalidPacket,
    /// Invalid/unsupported request number.
    Unimplemented,
    /// An encoder or decoder structure is invalid or already freed.
    InvalidState,
    /// Memory allocation has failed.
    AllocationFailure,
    /// A code outside the documented set.
    Unknown,
}

impl NativeErrorKind {
    /// Classifies a native return code. Non-negative codes are not errors
    /// and classify as `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            ffi::OPUS_BAD_ARG => Self::BadArgument,
            ffi::OPUS_BUFFER_TOO_SMALL => Self::BufferTooSmall,
            ffi::OPUS_INTERNAL_ERROR => Self::InternalError,
            ffi::OPUS_INVALID_PACKET => Self::InvalidPacket,
            ffi::OPUS_UNIMPLEMENTED => Self::Unimplemented,
            ffi::OPUS_INVALID_STATE => Self::InvalidState,
            ffi::OPUS_ALLOC_FAIL => Self::AllocationFailure,
            _ => Self::Unknown,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::BadArgument => "invalid argument",
            Self::BufferTooSmall => "buffer too small",
            Self::InternalError => "internal error",
            Self::InvalidPacket => "corrupted stream",
            Self::Unimplemented => "request not implemented",
            Self::InvalidState => "invalid state",
            Self::AllocationFailure => "memory allocation failed",
            Self::Unknown => "unknown error",
        }
    }
}

impl fmt::Display for NativeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Errors returned by the opus binding.
///
/// Validation variants are produced before any native call is made, so a
/// rejected call never mutates codec state. `Native` carries a translated
/// libopus failure; raw codes never escape any other way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpusError {
    /// A constructor argument is outside its enumerated domain.
    #[error("opus: {parameter} = {value} is not one of {domain}")]
    ConfigurationDomain {
        parameter: &'static str,
        value: i64,
        domain: &'static str,
    },

    /// A numeric parameter is outside its bounds.
    #[error("opus: {parameter} = {value} is out of range [{min}, {max}]")]
    ArgumentRange {
        parameter: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// An enumerated parameter value is not recognised.
    #[error("opus: {parameter} = {value} is not one of {domain}")]
    ArgumentDomain {
        parameter: &'static str,
        value: i64,
        domain: &'static str,
    },

    /// A requested length exceeds the capacity of the supplied buffer.
    #[error("opus: {buffer} length {requested} exceeds buffer capacity {capacity}")]
    BufferBounds {
        buffer: &'static str,
        requested: usize,
        capacity: usize,
    },

    /// A PCM length does not correspond to a legal Opus frame duration.
    #[error("opus: {pcm_bytes} PCM bytes at {sample_rate}Hz/{channels}ch is not a legal frame")]
    InvalidFrameDuration {
        pcm_bytes: usize,
        sample_rate: u32,
        channels: u32,
    },

    /// libopus returned a negative status code.
    #[error("opus: native error {code}: {kind}")]
    Native { code: i32, kind: NativeErrorKind },

    /// The encoder or decoder has been disposed.
    #[error("opus: resource already released")]
    UseAfterRelease,
}

impl OpusError {
    /// Builds a `Native` error from a raw return code.
    pub fn native(code: i32) -> Self {
        Self::Native {
            code,
            kind: NativeErrorKind::from_code(code),
        }
    }

    /// Returns the native error kind if this is a translated libopus failure.
    pub fn native_kind(&self) -> Option<NativeErrorKind> {
        match self {
            Self::Native { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Translates a native return value: non-negative values are counts,
/// negative values become `OpusError::Native`.
pub fn check(code: i32) -> Result<usize, OpusError> {
    if code < 0 {
        tracing::debug!(code, kind = %NativeErrorKind::from_code(code), "opus: native call failed");
        return Err(OpusError::native(code));
    }
    Ok(code as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(NativeErrorKind::from_code(-1), NativeErrorKind::BadArgument);
        assert_eq!(NativeErrorKind::from_code(-2), NativeErrorKind::BufferTooSmall);
        assert_eq!(NativeErrorKind::from_code(-3), NativeErrorKind::InternalError);
        assert_eq!(NativeErrorKind::from_code(-4), NativeErrorKind::InvalidPacket);
        assert_eq!(NativeErrorKind::from_code(-5), NativeErrorKind::Unimplemented);
        assert_eq!(NativeErrorKind::from_code(-6), NativeErrorKind::InvalidState);
        assert_eq!(NativeErrorKind::from_code(-7), NativeErrorKind::AllocationFailure);
    }

    #[test]
    fn test_unknown_code_keeps_raw_value() {
        let err = OpusError::native(-42);
        assert_eq!(
            err,
            OpusError::Native {
                code: -42,
                kind: NativeErrorKind::Unknown
            }
        );
        assert!(err.to_string().contains("-42"));
        assert_eq!(err.native_kind(), Some(NativeErrorKind::Unknown));
    }

    #[test]
    fn test_check_success_passes_count_through() {
        assert_eq!(check(0), Ok(0));
        assert_eq!(check(137), Ok(137));
    }

    #[test]
    fn test_check_failure() {
        let err = check(ffi::OPUS_BUFFER_TOO_SMALL).unwrap_err();
        assert_eq!(err.native_kind(), Some(NativeErrorKind::BufferTooSmall));
        assert!(err.to_string().contains("buffer too small"));
    }

    #[test]
    fn test_error_display() {
        let err = OpusError::ArgumentRange {
            parameter: "complexity",
            value: 11,
            min: 0,
            max: 10,
        };
        assert_eq!(err.to_string(), "opus: complexity = 11 is out of range [0, 10]");

        let err = OpusError::ConfigurationDomain {
            parameter: "sample_rate",
            value: 44100,
            domain: "{8000, 12000, 16000, 24000, 48000}",
        };
        assert!(err.to_string().contains("44100"));
        assert!(err.to_string().contains("48000"));

        let err = OpusError::BufferBounds {
            buffer: "pcm",
            requested: 10,
            capacity: 4,
        };
        assert!(err.to_string().contains("exceeds buffer capacity 4"));

        assert_eq!(
            OpusError::UseAfterRelease.to_string(),
            "opus: resource already released"
        );
        assert_eq!(OpusError::UseAfterRelease.native_kind(), None);
    }
}
