//! Encode raw PCM into a packet file.

use std::io::{Read, Write};

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;

use giztoy_opus::{Bitrate, Encoder, EncoderConfig};

use super::{create_output, open_input, output_result, read_full};
use crate::config::{encoder_config, CodecArgs, CodecFile};
use crate::packets::PacketWriter;
use crate::Cli;

/// Upper bound on one encoded packet.
const MAX_PACKET: usize = 4000;

/// Encode raw PCM into a packet file.
#[derive(Args)]
pub struct EncodeCommand {
    /// Input PCM file (s16le, interleaved)
    #[arg(short = 'i', long)]
    input: String,

    /// Output packet file
    #[arg(short = 'o', long)]
    output: String,

    /// Drop every Nth packet, writing a loss marker instead
    #[arg(long = "lose-every", default_value_t = 0)]
    lose_every: usize,

    #[command(flatten)]
    codec: CodecArgs,
}

/// Summary of an encode run.
#[derive(Debug, Serialize)]
pub struct EncodeReport {
    pub sample_rate: u32,
    pub channels: u32,
    pub frame_ms: f64,
    pub bitrate: Bitrate,
    pub frames: usize,
    pub lost: usize,
    pub pcm_bytes: usize,
    pub packet_bytes: usize,
}

impl EncodeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let file = CodecFile::load(cli.config.as_deref())?;
        let cfg = encoder_config(&file, &self.codec)?;

        let input = open_input(&self.input)?;
        let output = create_output(&self.output)?;
        let report = encode_stream(&cfg, input, output, self.lose_every)?;

        tracing::info!(
            frames = report.frames,
            lost = report.lost,
            output = %self.output,
            "encoded"
        );
        output_result(&report, cli.json)
    }
}

/// Encodes PCM from `input` frame by frame into packet records. A trailing
/// partial frame is padded with silence.
pub fn encode_stream<R: Read, W: Write>(
    cfg: &EncoderConfig,
    mut input: R,
    output: W,
    lose_every: usize,
) -> anyhow::Result<EncodeReport> {
    let encoder = Encoder::with_config(cfg).context("failed to create encoder")?;
    let frame = encoder.frame_geometry(cfg.frame_duration);

    let mut writer = PacketWriter::new(output);
    let mut pcm = vec![0u8; frame.pcm_bytes];
    let mut packet = vec![0u8; MAX_PACKET];
    let mut report = EncodeReport {
        sample_rate: cfg.sample_rate.hz(),
        channels: cfg.channels.count(),
        frame_ms: cfg.frame_duration.millis(),
        bitrate: cfg.bitrate,
        frames: 0,
        lost: 0,
        pcm_bytes: 0,
        packet_bytes: 0,
    };

    loop {
        let n = read_full(&mut input, &mut pcm).context("failed to read PCM")?;
        if n == 0 {
            break;
        }
        pcm[n..].fill(0);
        report.pcm_bytes += n;

        let size = encoder
            .encode(&pcm, pcm.len(), &mut packet, MAX_PACKET)
            .with_context(|| format!("failed to encode frame {}", report.frames))?;
        report.frames += 1;

        if lose_every > 0 && report.frames % lose_every == 0 {
            tracing::debug!(frame = report.frames - 1, "dropping packet");
            writer.write_lost()?;
            report.lost += 1;
        } else {
            writer.write_packet(&packet[..size])?;
            report.packet_bytes += size;
        }

        if n < pcm.len() {
            break;
        }
    }

    report.bitrate = encoder.bitrate()?;
    writer.into_inner()?;
    encoder.dispose();
    Ok(report)
}
