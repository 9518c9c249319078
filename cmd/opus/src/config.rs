//! Codec configuration for the CLI.
//!
//! A config file is YAML with optional `encoder` and `decoder` sections:
//!
//! ```yaml
//! encoder:
//!   sample_rate: 48000
//!   channels: 2
//!   application: audio
//!   bitrate: 64000
//!   frame_ms: 20
//!   inband_fec: true
//!   packet_loss_perc: 10
//! decoder:
//!   sample_rate: 48000
//!   channels: 2
//!   gain: 0
//! ```
//!
//! Command-line flags override the file.

use std::path::Path;

use anyhow::Context as _;
use clap::Args;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use giztoy_opus::{
    Application, Bandwidth, Bitrate, Channels, DecoderConfig, EncoderConfig, FrameDuration,
    SampleRate,
};

/// Contents of a codec config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodecFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoder: Option<EncoderConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoder: Option<DecoderConfig>,
}

impl CodecFile {
    /// Loads a config file, or an empty one when no path is given.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("failed to read config file {path}"))?;
        serde_yaml::from_str(&content).with_context(|| format!("invalid config file {path}"))
    }
}

/// Codec flags shared by the encode and decode commands.
#[derive(Args, Debug, Clone, Default)]
pub struct CodecArgs {
    /// Sample rate in Hz (8000, 12000, 16000, 24000, 48000)
    #[arg(short = 'r', long, value_parser = parse_value::<SampleRate>)]
    pub rate: Option<SampleRate>,

    /// Number of channels (1 or 2)
    #[arg(short = 'c', long, value_parser = parse_value::<Channels>)]
    pub channels: Option<Channels>,

    /// Frame duration in ms (2.5, 5, 10, 20, 40, 60)
    #[arg(long = "frame-ms", value_parser = parse_value::<FrameDuration>)]
    pub frame: Option<FrameDuration>,

    /// Encoder application (voip, audio, restricted_lowdelay)
    #[arg(short = 'a', long, value_parser = parse_value::<Application>)]
    pub application: Option<Application>,

    /// Bitrate in bits per second, or "auto" / "max"
    #[arg(short = 'b', long, value_parser = parse_value::<Bitrate>)]
    pub bitrate: Option<Bitrate>,

    /// Encoder complexity (0-10)
    #[arg(long)]
    pub complexity: Option<i32>,

    /// Enable in-band forward error correction
    #[arg(long)]
    pub fec: bool,

    /// Expected packet loss percentage (0-100)
    #[arg(long = "loss-perc")]
    pub packet_loss_perc: Option<i32>,

    /// Enable discontinuous transmission
    #[arg(long)]
    pub dtx: bool,

    /// Maximum bandwidth (nb, mb, wb, swb, fb)
    #[arg(long = "max-bandwidth", value_parser = parse_value::<Bandwidth>)]
    pub max_bandwidth: Option<Bandwidth>,

    /// Decoder gain in Q8 dB
    #[arg(long, allow_negative_numbers = true)]
    pub gain: Option<i32>,
}

/// Parses a flag value with the same rules as the config file.
fn parse_value<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_yaml::from_str(s).map_err(|e| e.to_string())
}

fn default_encoder() -> EncoderConfig {
    EncoderConfig::new(SampleRate::Hz48000, Channels::Mono, Application::default())
}

/// Resolves the encoder configuration from file and flags.
pub fn encoder_config(file: &CodecFile, args: &CodecArgs) -> anyhow::Result<EncoderConfig> {
    let mut cfg = file.encoder.clone().unwrap_or_else(default_encoder);

    if let Some(rate) = args.rate {
        cfg.sample_rate = rate;
    }
    if let Some(channels) = args.channels {
        cfg.channels = channels;
    }
    if let Some(frame) = args.frame {
        cfg.frame_duration = frame;
    }
    if let Some(application) = args.application {
        cfg.application = application;
    }
    if let Some(bitrate) = args.bitrate {
        cfg.bitrate = bitrate;
    }
    if args.complexity.is_some() {
        cfg.complexity = args.complexity;
    }
    if args.fec {
        cfg.inband_fec = Some(true);
    }
    if args.packet_loss_perc.is_some() {
        cfg.packet_loss_perc = args.packet_loss_perc;
    }
    if args.dtx {
        cfg.dtx = Some(true);
    }
    if args.max_bandwidth.is_some() {
        cfg.max_bandwidth = args.max_bandwidth;
    }

    cfg.validate().context("invalid encoder config")?;
    Ok(cfg)
}

/// Resolves the decoder configuration from file and flags.
///
/// Without a `decoder` section the stream shape follows the `encoder`
/// section.
pub fn decoder_config(file: &CodecFile, args: &CodecArgs) -> anyhow::Result<DecoderConfig> {
    let mut cfg = match (&file.decoder, &file.encoder) {
        (Some(dec), _) => dec.clone(),
        (None, Some(enc)) => DecoderConfig::from(enc),
        (None, None) => DecoderConfig::from(&default_encoder()),
    };

    if let Some(rate) = args.rate {
        cfg.sample_rate = rate;
    }
    if let Some(channels) = args.channels {
        cfg.channels = channels;
    }
    if let Some(frame) = args.frame {
        cfg.frame_duration = frame;
    }
    if args.gain.is_some() {
        cfg.gain = args.gain;
    }

    cfg.validate().context("invalid decoder config")?;
    Ok(cfg)
}
