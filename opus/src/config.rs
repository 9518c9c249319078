//! Serializable encoder and decoder configuration.
//!
//! Optional settings left unset keep the libopus defaults.

use serde::{Deserialize, Serialize};

use crate::error::OpusError;
use crate::params::{
    self, Application, Bandwidth, Bitrate, Channels, ForceChannels, SampleRate,
};
use crate::units::FrameDuration;

/// Encoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub sample_rate: SampleRate,
    pub channels: Channels,

    #[serde(default)]
    pub application: Application,

    #[serde(default)]
    pub bitrate: Bitrate,

    /// Frame duration used by callers that slice PCM into frames.
    #[serde(default, rename = "frame_ms")]
    pub frame_duration: FrameDuration,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vbr: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inband_fec: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_loss_perc: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtx: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bandwidth: Option<Bandwidth>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_channels: Option<ForceChannels>,
}

impl EncoderConfig {
    /// Creates a configuration with automatic bitrate and library defaults.
    pub fn new(sample_rate: SampleRate, channels: Channels, application: Application) -> Self {
        Self {
            sample_rate,
            channels,
            application,
            bitrate: Bitrate::Auto,
            frame_duration: FrameDuration::default(),
            complexity: None,
            vbr: None,
            inband_fec: None,
            packet_loss_perc: None,
            dtx: None,
            max_bandwidth: None,
            force_channels: None,
        }
    }

    /// Checks every numeric setting against its range.
    pub fn validate(&self) -> Result<(), OpusError> {
        self.bitrate.validate()?;
        if let Some(complexity) = self.complexity {
            params::validate_complexity(complexity)?;
        }
        if let Some(perc) = self.packet_loss_perc {
            params::validate_packet_loss_perc(perc)?;
        }
        Ok(())
    }
}

/// Decoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    pub sample_rate: SampleRate,
    pub channels: Channels,

    /// Frame duration of the convenience decode and concealment paths.
    #[serde(default, rename = "frame_ms")]
    pub frame_duration: FrameDuration,

    /// Output gain in Q8 dB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<i32>,
}

impl DecoderConfig {
    pub fn new(sample_rate: SampleRate, channels: Channels) -> Self {
        Self {
            sample_rate,
            channels,
            frame_duration: FrameDuration::default(),
            gain: None,
        }
    }

    pub fn validate(&self) -> Result<(), OpusError> {
        if let Some(gain) = self.gain {
            params::validate_gain(gain)?;
        }
        Ok(())
    }
}

impl From<&EncoderConfig> for DecoderConfig {
    /// A decoder matching the encoder's stream shape.
    fn from(cfg: &EncoderConfig) -> Self {
        Self {
            sample_rate: cfg.sample_rate,
            channels: cfg.channels,
            frame_duration: cfg.frame_duration,
            gain: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_config_defaults() {
        let cfg: EncoderConfig =
            serde_json::from_str(r#"{"sample_rate": 16000, "channels": 1}"#).unwrap();
        assert_eq!(cfg, EncoderConfig::new(SampleRate::Hz16000, Channels::Mono, Application::VoIP));
        assert_eq!(cfg.bitrate, Bitrate::Auto);
        assert_eq!(cfg.frame_duration, FrameDuration::Duration20ms);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_encoder_config_full() {
        let cfg: EncoderConfig = serde_json::from_str(
            r#"{
                "sample_rate": 48000,
                "channels": 2,
                "application": "audio",
                "bitrate": 96000,
                "frame_ms": 2.5,
                "complexity": 10,
                "vbr": false,
                "inband_fec": true,
                "packet_loss_perc": 15,
                "dtx": true,
                "max_bandwidth": "swb",
                "force_channels": "mono"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.channels, Channels::Stereo);
        assert_eq!(cfg.application, Application::Audio);
        assert_eq!(cfg.bitrate, Bitrate::Bits(96000));
        assert_eq!(cfg.frame_duration, FrameDuration::Duration2500us);
        assert_eq!(cfg.max_bandwidth, Some(Bandwidth::SWB));
        assert_eq!(cfg.force_channels, Some(ForceChannels::Mono));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_encoder_config_rejects_bad_domains() {
        for json in [
            r#"{"sample_rate": 44100, "channels": 1}"#,
            r#"{"sample_rate": 16000, "channels": 3}"#,
            r#"{"sample_rate": 16000, "channels": 1, "frame_ms": 30}"#,
        ] {
            assert!(serde_json::from_str::<EncoderConfig>(json).is_err(), "{json}");
        }
    }

    #[test]
    fn test_encoder_config_validate_ranges() {
        let mut cfg = EncoderConfig::new(SampleRate::Hz16000, Channels::Mono, Application::VoIP);
        cfg.complexity = Some(11);
        assert!(matches!(
            cfg.validate(),
            Err(OpusError::ArgumentRange { parameter: "complexity", .. })
        ));

        cfg.complexity = Some(5);
        cfg.packet_loss_perc = Some(101);
        assert!(matches!(
            cfg.validate(),
            Err(OpusError::ArgumentRange { parameter: "packet_loss_perc", .. })
        ));

        cfg.packet_loss_perc = None;
        cfg.bitrate = Bitrate::Bits(100);
        assert!(matches!(
            cfg.validate(),
            Err(OpusError::ArgumentRange { parameter: "bitrate", .. })
        ));
    }

    #[test]
    fn test_decoder_config() {
        let json = r#"{"sample_rate": 24000, "channels": 2, "frame_ms": 10, "gain": 256}"#;
        let cfg: DecoderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.frame_duration, FrameDuration::Duration10ms);
        assert_eq!(cfg.gain, Some(256));
        assert!(cfg.validate().is_ok());

        let bad = DecoderConfig {
            gain: Some(i32::MAX),
            ..DecoderConfig::new(SampleRate::Hz8000, Channels::Mono)
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_decoder_config_from_encoder() {
        let mut enc = EncoderConfig::new(SampleRate::Hz12000, Channels::Stereo, Application::Audio);
        enc.frame_duration = FrameDuration::Duration40ms;
        let dec = DecoderConfig::from(&enc);
        assert_eq!(dec.sample_rate, SampleRate::Hz12000);
        assert_eq!(dec.channels, Channels::Stereo);
        assert_eq!(dec.frame_duration, FrameDuration::Duration40ms);
    }
}
