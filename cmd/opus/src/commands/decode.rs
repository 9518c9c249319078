//! Decode a packet file into raw PCM.

use std::io::{Read, Write};

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;

use giztoy_opus::units;
use giztoy_opus::{Decoder, DecoderConfig};

use super::{create_output, open_input, output_result};
use crate::config::{decoder_config, CodecArgs, CodecFile};
use crate::packets::{PacketReader, Record};
use crate::Cli;

/// Decode a packet file into raw PCM.
#[derive(Args)]
pub struct DecodeCommand {
    /// Input packet file
    #[arg(short = 'i', long)]
    input: String,

    /// Output PCM file (s16le, interleaved)
    #[arg(short = 'o', long)]
    output: String,

    /// Conceal lost packets only, ignoring FEC data in the next packet
    #[arg(long = "no-fec")]
    no_fec: bool,

    #[command(flatten)]
    codec: CodecArgs,
}

/// Summary of a decode run.
#[derive(Debug, Serialize)]
pub struct DecodeReport {
    pub sample_rate: u32,
    pub channels: u32,
    pub frame_ms: f64,
    pub packets: usize,
    pub concealed: usize,
    pub recovered: usize,
    pub pcm_bytes: usize,
}

impl DecodeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let file = CodecFile::load(cli.config.as_deref())?;
        let cfg = decoder_config(&file, &self.codec)?;

        let input = open_input(&self.input)?;
        let output = create_output(&self.output)?;
        let report = decode_stream(&cfg, input, output, !self.no_fec)?;

        tracing::info!(
            packets = report.packets,
            concealed = report.concealed,
            output = %self.output,
            "decoded"
        );
        output_result(&report, cli.json)
    }
}

/// Decodes packet records from `input` into PCM.
///
/// A loss marker followed by a packet is recovered from that packet's FEC
/// data when `fec` is set; otherwise the frame is concealed.
pub fn decode_stream<R: Read, W: Write>(
    cfg: &DecoderConfig,
    input: R,
    mut output: W,
    fec: bool,
) -> anyhow::Result<DecodeReport> {
    let decoder = Decoder::with_config(cfg).context("failed to create decoder")?;
    let frame = decoder.default_frame();

    let mut pcm = vec![0u8; frame.pcm_bytes];
    let mut samples = vec![0i16; frame.total_samples()];
    let mut report = DecodeReport {
        sample_rate: cfg.sample_rate.hz(),
        channels: cfg.channels.count(),
        frame_ms: cfg.frame_duration.millis(),
        packets: 0,
        concealed: 0,
        recovered: 0,
        pcm_bytes: 0,
    };

    let mut records = PacketReader::new(input).peekable();
    let mut index = 0;
    while let Some(record) = records.next() {
        let record = record.with_context(|| format!("failed to read record {index}"))?;
        let n = match record {
            Record::Packet(packet) => {
                let n = decoder
                    .decode(Some(&packet), packet.len(), &mut pcm, frame.pcm_bytes)
                    .with_context(|| format!("failed to decode packet {index}"))?;
                report.packets += 1;
                n
            }
            Record::Lost => match records.peek() {
                Some(Ok(Record::Packet(next))) if fec => {
                    let spc = decoder
                        .decode_samples(Some(next.as_slice()), &mut samples, true)
                        .with_context(|| format!("failed to recover packet {index}"))?;
                    report.recovered += 1;
                    let total = spc * cfg.channels.count() as usize;
                    units::write_le_samples(&samples[..total], &mut pcm)
                }
                _ => {
                    let n = decoder
                        .conceal(&mut pcm)
                        .with_context(|| format!("failed to conceal packet {index}"))?;
                    report.concealed += 1;
                    n
                }
            },
        };
        output.write_all(&pcm[..n]).context("failed to write PCM")?;
        report.pcm_bytes += n;
        index += 1;
    }

    output.flush()?;
    decoder.dispose();
    Ok(report)
}
