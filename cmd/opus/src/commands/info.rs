//! Library version and frame geometry.

use clap::Args;
use serde::Serialize;

use giztoy_opus::{Channels, FrameDuration, FrameGeometry, SampleRate};

use super::output_result;
use crate::config::{encoder_config, CodecArgs, CodecFile};
use crate::Cli;

/// Show the libopus version and frame sizes for a stream shape.
#[derive(Args)]
pub struct InfoCommand {
    #[command(flatten)]
    codec: CodecArgs,
}

#[derive(Debug, Serialize)]
pub struct Info {
    pub version: String,
    pub sample_rate: u32,
    pub channels: u32,
    pub frames: Vec<FrameInfo>,
}

#[derive(Debug, Serialize)]
pub struct FrameInfo {
    pub frame_ms: f64,
    pub samples_per_channel: usize,
    pub pcm_bytes: usize,
}

impl InfoCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let file = CodecFile::load(cli.config.as_deref())?;
        let cfg = encoder_config(&file, &self.codec)?;
        output_result(&info(cfg.sample_rate, cfg.channels), cli.json)
    }
}

pub fn info(sample_rate: SampleRate, channels: Channels) -> Info {
    let frames = FrameDuration::ALL
        .into_iter()
        .map(|fd| {
            let g = FrameGeometry::new(fd, sample_rate.hz(), channels.count());
            FrameInfo {
                frame_ms: fd.millis(),
                samples_per_channel: g.samples_per_channel,
                pcm_bytes: g.pcm_bytes,
            }
        })
        .collect();

    Info {
        version: giztoy_opus::version(),
        sample_rate: sample_rate.hz(),
        channels: channels.count(),
        frames,
    }
}
