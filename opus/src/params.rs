//! Codec parameter domains and validation.
//!
//! Every value handed to libopus passes through one of these types or
//! checks first. Integer inputs are converted with `TryFrom`, which fails
//! with an error naming the parameter and its legal domain.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OpusError;
use crate::ffi;

const SAMPLE_RATE_DOMAIN: &str = "{8000, 12000, 16000, 24000, 48000}";
const CHANNELS_DOMAIN: &str = "{1, 2}";
const APPLICATION_DOMAIN: &str = "{2048 (voip), 2049 (audio), 2051 (restricted_lowdelay)}";
const BANDWIDTH_DOMAIN: &str = "{1101 (nb), 1102 (mb), 1103 (wb), 1104 (swb), 1105 (fb)}";
const FORCE_CHANNELS_DOMAIN: &str = "{-1000 (auto), 1 (mono), 2 (stereo)}";

/// Lowest explicit bitrate libopus honours, in bits per second.
pub const MIN_BITRATE: i32 = 500;
/// Highest explicit bitrate libopus honours, in bits per second.
pub const MAX_BITRATE: i32 = 512_000;
pub const MIN_COMPLEXITY: i32 = 0;
pub const MAX_COMPLEXITY: i32 = 10;
pub const MIN_PACKET_LOSS_PERC: i32 = 0;
pub const MAX_PACKET_LOSS_PERC: i32 = 100;
/// Decoder gain bounds in Q8 dB.
pub const MIN_GAIN: i32 = -32768;
pub const MAX_GAIN: i32 = 32767;

/// Checks `value` against an inclusive range.
pub fn check_range(
    parameter: &'static str,
    value: i32,
    min: i32,
    max: i32,
) -> Result<i32, OpusError> {
    if value < min || value > max {
        return Err(OpusError::ArgumentRange {
            parameter,
            value: value as i64,
            min: min as i64,
            max: max as i64,
        });
    }
    Ok(value)
}

/// Validates an encoder complexity (0-10).
pub fn validate_complexity(complexity: i32) -> Result<i32, OpusError> {
    check_range("complexity", complexity, MIN_COMPLEXITY, MAX_COMPLEXITY)
}

/// Validates an expected packet loss percentage (0-100).
pub fn validate_packet_loss_perc(perc: i32) -> Result<i32, OpusError> {
    check_range("packet_loss_perc", perc, MIN_PACKET_LOSS_PERC, MAX_PACKET_LOSS_PERC)
}

/// Validates a decoder gain in Q8 dB.
pub fn validate_gain(gain: i32) -> Result<i32, OpusError> {
    check_range("gain", gain, MIN_GAIN, MAX_GAIN)
}

/// Checks that `requested` elements fit in a buffer of `capacity`.
pub fn check_buffer(
    buffer: &'static str,
    requested: usize,
    capacity: usize,
) -> Result<usize, OpusError> {
    if requested > capacity {
        return Err(OpusError::BufferBounds {
            buffer,
            requested,
            capacity,
        });
    }
    Ok(requested)
}

/// Decodes a native boolean (0 or 1).
pub(crate) fn bool_from_ffi(parameter: &'static str, value: i32) -> Result<bool, OpusError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(OpusError::ArgumentDomain {
            parameter,
            value: value as i64,
            domain: "{0, 1}",
        }),
    }
}

/// Supported sample rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleRate {
    Hz8000,
    Hz12000,
    Hz16000,
    Hz24000,
    Hz48000,
}

impl SampleRate {
    /// Returns the rate in Hz.
    pub const fn hz(&self) -> u32 {
        match self {
            Self::Hz8000 => 8000,
            Self::Hz12000 => 12000,
            Self::Hz16000 => 16000,
            Self::Hz24000 => 24000,
            Self::Hz48000 => 48000,
        }
    }
}

impl TryFrom<i32> for SampleRate {
    type Error = OpusError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            8000 => Ok(Self::Hz8000),
            12000 => Ok(Self::Hz12000),
            16000 => Ok(Self::Hz16000),
            24000 => Ok(Self::Hz24000),
            48000 => Ok(Self::Hz48000),
            _ => Err(OpusError::ConfigurationDomain {
                parameter: "sample_rate",
                value: value as i64,
                domain: SAMPLE_RATE_DOMAIN,
            }),
        }
    }
}

impl From<SampleRate> for i32 {
    fn from(rate: SampleRate) -> i32 {
        rate.hz() as i32
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz", self.hz())
    }
}

impl Serialize for SampleRate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.hz())
    }
}

impl<'de> Deserialize<'de> for SampleRate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i32::deserialize(deserializer)?;
        SampleRate::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    /// Returns the channel count.
    pub const fn count(&self) -> u32 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

impl TryFrom<i32> for Channels {
    type Error = OpusError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Mono),
            2 => Ok(Self::Stereo),
            _ => Err(OpusError::ConfigurationDomain {
                parameter: "channels",
                value: value as i64,
                domain: CHANNELS_DOMAIN,
            }),
        }
    }
}

impl Serialize for Channels {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.count())
    }
}

impl<'de> Deserialize<'de> for Channels {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i32::deserialize(deserializer)?;
        Channels::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Opus application type, the encoder's optimization profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Application {
    /// Best quality for voice signals.
    #[default]
    #[serde(rename = "voip", alias = "speech")]
    VoIP,
    /// Best quality for non-voice signals.
    #[serde(alias = "quality")]
    Audio,
    /// Minimum possible coding delay.
    #[serde(alias = "speed")]
    RestrictedLowdelay,
}

impl Application {
    pub(crate) fn to_ffi(self) -> i32 {
        match self {
            Self::VoIP => ffi::OPUS_APPLICATION_VOIP,
            Self::Audio => ffi::OPUS_APPLICATION_AUDIO,
            Self::RestrictedLowdelay => ffi::OPUS_APPLICATION_RESTRICTED_LOWDELAY,
        }
    }
}

impl TryFrom<i32> for Application {
    type Error = OpusError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            ffi::OPUS_APPLICATION_VOIP => Ok(Self::VoIP),
            ffi::OPUS_APPLICATION_AUDIO => Ok(Self::Audio),
            ffi::OPUS_APPLICATION_RESTRICTED_LOWDELAY => Ok(Self::RestrictedLowdelay),
            _ => Err(OpusError::ConfigurationDomain {
                parameter: "application",
                value: value as i64,
                domain: APPLICATION_DOMAIN,
            }),
        }
    }
}

/// Encoder bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "BitrateRepr", into = "BitrateRepr")]
pub enum Bitrate {
    /// Let libopus pick; the output buffer size bounds the rate.
    #[default]
    Auto,
    /// As many bits as the output buffer allows.
    Max,
    /// Explicit bits per second, 500 to 512000.
    Bits(i32),
}

impl Bitrate {
    /// Checks an explicit rate against the legal range.
    pub fn validate(self) -> Result<Self, OpusError> {
        if let Self::Bits(bits) = self {
            check_range("bitrate", bits, MIN_BITRATE, MAX_BITRATE)?;
        }
        Ok(self)
    }

    pub(crate) fn to_ffi(self) -> i32 {
        match self {
            Self::Auto => ffi::OPUS_AUTO,
            Self::Max => ffi::OPUS_BITRATE_MAX,
            Self::Bits(bits) => bits,
        }
    }

    /// Decodes a native value. libopus reports the effective rate once a
    /// bitrate has been chosen, so any positive value is accepted here.
    pub(crate) fn from_ffi(value: i32) -> Result<Self, OpusError> {
        match value {
            ffi::OPUS_AUTO => Ok(Self::Auto),
            ffi::OPUS_BITRATE_MAX => Ok(Self::Max),
            v if v > 0 => Ok(Self::Bits(v)),
            v => Err(OpusError::ArgumentDomain {
                parameter: "bitrate",
                value: v as i64,
                domain: "{-1000 (auto), -1 (max), positive bits per second}",
            }),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BitrateRepr {
    Bits(i32),
    Named(String),
}

impl TryFrom<BitrateRepr> for Bitrate {
    type Error = String;

    fn try_from(repr: BitrateRepr) -> Result<Self, Self::Error> {
        match repr {
            BitrateRepr::Bits(bits) => Bitrate::Bits(bits).validate().map_err(|e| e.to_string()),
            BitrateRepr::Named(name) => match name.as_str() {
                "auto" => Ok(Bitrate::Auto),
                "max" => Ok(Bitrate::Max),
                other => Err(format!(
                    "opus: unknown bitrate {other:?}, expected \"auto\", \"max\" or bits per second"
                )),
            },
        }
    }
}

impl From<Bitrate> for BitrateRepr {
    fn from(bitrate: Bitrate) -> Self {
        match bitrate {
            Bitrate::Auto => BitrateRepr::Named("auto".into()),
            Bitrate::Max => BitrateRepr::Named("max".into()),
            Bitrate::Bits(bits) => BitrateRepr::Bits(bits),
        }
    }
}

/// Audio bandwidth, the five quality bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bandwidth {
    /// Narrowband (4 kHz audio bandpass)
    NB,
    /// Medium-band (6 kHz audio bandpass)
    MB,
    /// Wideband (8 kHz audio bandpass)
    WB,
    /// Super-wideband (12 kHz audio bandpass)
    SWB,
    /// Fullband (20 kHz audio bandpass)
    FB,
}

impl Bandwidth {
    pub(crate) fn to_ffi(self) -> i32 {
        match self {
            Self::NB => ffi::OPUS_BANDWIDTH_NARROWBAND,
            Self::MB => ffi::OPUS_BANDWIDTH_MEDIUMBAND,
            Self::WB => ffi::OPUS_BANDWIDTH_WIDEBAND,
            Self::SWB => ffi::OPUS_BANDWIDTH_SUPERWIDEBAND,
            Self::FB => ffi::OPUS_BANDWIDTH_FULLBAND,
        }
    }
}

impl TryFrom<i32> for Bandwidth {
    type Error = OpusError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            ffi::OPUS_BANDWIDTH_NARROWBAND => Ok(Self::NB),
            ffi::OPUS_BANDWIDTH_MEDIUMBAND => Ok(Self::MB),
            ffi::OPUS_BANDWIDTH_WIDEBAND => Ok(Self::WB),
            ffi::OPUS_BANDWIDTH_SUPERWIDEBAND => Ok(Self::SWB),
            ffi::OPUS_BANDWIDTH_FULLBAND => Ok(Self::FB),
            _ => Err(OpusError::ArgumentDomain {
                parameter: "bandwidth",
                value: value as i64,
                domain: BANDWIDTH_DOMAIN,
            }),
        }
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NB => write!(f, "NB"),
            Self::MB => write!(f, "MB"),
            Self::WB => write!(f, "WB"),
            Self::SWB => write!(f, "SWB"),
            Self::FB => write!(f, "FB"),
        }
    }
}

/// Forced channel mode of the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForceChannels {
    /// Follow the input.
    #[default]
    Auto,
    Mono,
    Stereo,
}

impl ForceChannels {
    pub(crate) fn to_ffi(self) -> i32 {
        match self {
            Self::Auto => ffi::OPUS_AUTO,
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

impl TryFrom<i32> for ForceChannels {
    type Error = OpusError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            ffi::OPUS_AUTO => Ok(Self::Auto),
            1 => Ok(Self::Mono),
            2 => Ok(Self::Stereo),
            _ => Err(OpusError::ArgumentDomain {
                parameter: "force_channels",
                value: value as i64,
                domain: FORCE_CHANNELS_DOMAIN,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rate_domain() {
        for hz in [8000, 12000, 16000, 24000, 48000] {
            assert_eq!(SampleRate::try_from(hz).unwrap().hz() as i32, hz);
        }
        for hz in [0, -1, 44100, 96000, 22050] {
            let err = SampleRate::try_from(hz).unwrap_err();
            assert!(matches!(err, OpusError::ConfigurationDomain { parameter: "sample_rate", .. }));
        }
    }

    #[test]
    fn test_channels_domain() {
        assert_eq!(Channels::try_from(1).unwrap(), Channels::Mono);
        assert_eq!(Channels::try_from(2).unwrap().count(), 2);
        for ch in [0, 3, -1, 255] {
            assert!(matches!(
                Channels::try_from(ch),
                Err(OpusError::ConfigurationDomain { parameter: "channels", .. })
            ));
        }
    }

    #[test]
    fn test_complexity_range() {
        assert_eq!(validate_complexity(0), Ok(0));
        assert_eq!(validate_complexity(10), Ok(10));
        assert_eq!(
            validate_complexity(11),
            Err(OpusError::ArgumentRange {
                parameter: "complexity",
                value: 11,
                min: 0,
                max: 10
            })
        );
        assert!(validate_complexity(-1).is_err());
    }

    #[test]
    fn test_packet_loss_range() {
        assert!(validate_packet_loss_perc(0).is_ok());
        assert!(validate_packet_loss_perc(100).is_ok());
        assert!(validate_packet_loss_perc(101).is_err());
        assert!(validate_packet_loss_perc(-5).is_err());
    }

    #[test]
    fn test_gain_range() {
        assert!(validate_gain(MIN_GAIN).is_ok());
        assert!(validate_gain(MAX_GAIN).is_ok());
        assert!(validate_gain(40000).is_err());
    }

    #[test]
    fn test_bitrate() {
        assert_eq!(Bitrate::Auto.to_ffi(), ffi::OPUS_AUTO);
        assert_eq!(Bitrate::Max.to_ffi(), ffi::OPUS_BITRATE_MAX);
        assert!(Bitrate::Bits(500).validate().is_ok());
        assert!(Bitrate::Bits(512_000).validate().is_ok());
        assert!(Bitrate::Bits(499).validate().is_err());
        assert!(Bitrate::Bits(0).validate().is_err());
        assert_eq!(Bitrate::from_ffi(-1000), Ok(Bitrate::Auto));
        assert_eq!(Bitrate::from_ffi(32000), Ok(Bitrate::Bits(32000)));
        assert!(Bitrate::from_ffi(-7).is_err());
    }

    #[test]
    fn test_bitrate_serde() {
        let b: Bitrate = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(b, Bitrate::Auto);
        let b: Bitrate = serde_json::from_str("\"max\"").unwrap();
        assert_eq!(b, Bitrate::Max);
        let b: Bitrate = serde_json::from_str("24000").unwrap();
        assert_eq!(b, Bitrate::Bits(24000));
        assert!(serde_json::from_str::<Bitrate>("100").is_err());
        assert!(serde_json::from_str::<Bitrate>("\"fast\"").is_err());
        assert_eq!(serde_json::to_string(&Bitrate::Max).unwrap(), "\"max\"");
    }

    #[test]
    fn test_bandwidth_ffi() {
        for bw in [Bandwidth::NB, Bandwidth::MB, Bandwidth::WB, Bandwidth::SWB, Bandwidth::FB] {
            assert_eq!(Bandwidth::try_from(bw.to_ffi()).unwrap(), bw);
        }
        assert!(matches!(
            Bandwidth::try_from(1100),
            Err(OpusError::ArgumentDomain { parameter: "bandwidth", .. })
        ));
    }

    #[test]
    fn test_force_channels_ffi() {
        assert_eq!(ForceChannels::try_from(-1000).unwrap(), ForceChannels::Auto);
        assert_eq!(ForceChannels::try_from(1).unwrap(), ForceChannels::Mono);
        assert_eq!(ForceChannels::Stereo.to_ffi(), 2);
        assert!(ForceChannels::try_from(3).is_err());
    }

    #[test]
    fn test_application_names() {
        let app: Application = serde_json::from_str("\"voip\"").unwrap();
        assert_eq!(app, Application::VoIP);
        let app: Application = serde_json::from_str("\"speech\"").unwrap();
        assert_eq!(app, Application::VoIP);
        let app: Application = serde_json::from_str("\"quality\"").unwrap();
        assert_eq!(app, Application::Audio);
        let app: Application = serde_json::from_str("\"restricted_lowdelay\"").unwrap();
        assert_eq!(app, Application::RestrictedLowdelay);
        assert_eq!(Application::try_from(2049).unwrap(), Application::Audio);
        assert!(Application::try_from(2050).is_err());
    }

    #[test]
    fn test_check_buffer() {
        assert_eq!(check_buffer("pcm", 0, 0), Ok(0));
        assert_eq!(check_buffer("pcm", 640, 640), Ok(640));
        assert_eq!(
            check_buffer("pcm", 641, 640),
            Err(OpusError::BufferBounds {
                buffer: "pcm",
                requested: 641,
                capacity: 640
            })
        );
    }

    #[test]
    fn test_bool_from_ffi() {
        assert_eq!(bool_from_ffi("dtx", 0), Ok(false));
        assert_eq!(bool_from_ffi("dtx", 1), Ok(true));
        assert!(bool_from_ffi("dtx", 2).is_err());
    }
}
