//! Tunable codec parameters and their native control request codes.

use std::fmt;
use std::os::raw::c_int;

use crate::ffi;

/// A parameter reachable through `opus_encoder_ctl` / `opus_decoder_ctl`.
///
/// Settable parameters carry a get/set request pair; the rest are read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ctl {
    Bitrate,
    Vbr,
    MaxBandwidth,
    Complexity,
    InbandFec,
    PacketLossPerc,
    Dtx,
    ForceChannels,
    Gain,
    Lookahead,
    Bandwidth,
    LastPacketDuration,
}

impl Ctl {
    /// Request code of the getter.
    pub fn get_request(&self) -> c_int {
        match self {
            Self::Bitrate => ffi::OPUS_GET_BITRATE_REQUEST,
            Self::Vbr => ffi::OPUS_GET_VBR_REQUEST,
            Self::MaxBandwidth => ffi::OPUS_GET_MAX_BANDWIDTH_REQUEST,
            Self::Complexity => ffi::OPUS_GET_COMPLEXITY_REQUEST,
            Self::InbandFec => ffi::OPUS_GET_INBAND_FEC_REQUEST,
            Self::PacketLossPerc => ffi::OPUS_GET_PACKET_LOSS_PERC_REQUEST,
            Self::Dtx => ffi::OPUS_GET_DTX_REQUEST,
            Self::ForceChannels => ffi::OPUS_GET_FORCE_CHANNELS_REQUEST,
            Self::Gain => ffi::OPUS_GET_GAIN_REQUEST,
            Self::Lookahead => ffi::OPUS_GET_LOOKAHEAD_REQUEST,
            Self::Bandwidth => ffi::OPUS_GET_BANDWIDTH_REQUEST,
            Self::LastPacketDuration => ffi::OPUS_GET_LAST_PACKET_DURATION_REQUEST,
        }
    }

    /// Request code of the setter, `None` for read-only parameters.
    pub fn set_request(&self) -> Option<c_int> {
        match self {
            Self::Bitrate => Some(ffi::OPUS_SET_BITRATE_REQUEST),
            Self::Vbr => Some(ffi::OPUS_SET_VBR_REQUEST),
            Self::MaxBandwidth => Some(ffi::OPUS_SET_MAX_BANDWIDTH_REQUEST),
            Self::Complexity => Some(ffi::OPUS_SET_COMPLEXITY_REQUEST),
            Self::InbandFec => Some(ffi::OPUS_SET_INBAND_FEC_REQUEST),
            Self::PacketLossPerc => Some(ffi::OPUS_SET_PACKET_LOSS_PERC_REQUEST),
            Self::Dtx => Some(ffi::OPUS_SET_DTX_REQUEST),
            Self::ForceChannels => Some(ffi::OPUS_SET_FORCE_CHANNELS_REQUEST),
            Self::Gain => Some(ffi::OPUS_SET_GAIN_REQUEST),
            Self::Lookahead | Self::Bandwidth | Self::LastPacketDuration => None,
        }
    }

    /// Parameter name used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bitrate => "bitrate",
            Self::Vbr => "vbr",
            Self::MaxBandwidth => "max_bandwidth",
            Self::Complexity => "complexity",
            Self::InbandFec => "inband_fec",
            Self::PacketLossPerc => "packet_loss_perc",
            Self::Dtx => "dtx",
            Self::ForceChannels => "force_channels",
            Self::Gain => "gain",
            Self::Lookahead => "lookahead",
            Self::Bandwidth => "bandwidth",
            Self::LastPacketDuration => "last_packet_duration",
        }
    }
}

impl fmt::Display for Ctl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
