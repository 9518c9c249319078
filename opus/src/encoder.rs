//! Opus encoder.

use std::fmt;

use crate::config::EncoderConfig;
use crate::ctl::Ctl;
use crate::error::{check, OpusError};
use crate::ffi::{self, OpusEncoder as OpusEncoderHandle};
use crate::handle::NativeHandle;
use crate::params::{
    self, Application, Bandwidth, Bitrate, Channels, ForceChannels, SampleRate,
};
use crate::units::{self, FrameDuration, FrameGeometry, BYTES_PER_SAMPLE};

/// Opus encoder.
///
/// Every method takes `&self`; calls on one encoder are serialized by its
/// handle, so an encoder may be shared behind an `Arc`. After
/// [`dispose`](Self::dispose) every codec operation fails with
/// [`OpusError::UseAfterRelease`].
pub struct Encoder {
    sample_rate: SampleRate,
    channels: Channels,
    application: Application,
    handle: NativeHandle<OpusEncoderHandle>,
}

impl Encoder {
    /// Creates a new Opus encoder.
    ///
    /// # Parameters
    /// - `sample_rate`: Sample rate (8000, 12000, 16000, 24000, or 48000)
    /// - `channels`: Number of channels (1 or 2)
    /// - `application`: Intended application type
    pub fn new(
        sample_rate: i32,
        channels: i32,
        application: Application,
    ) -> Result<Self, OpusError> {
        let sample_rate = SampleRate::try_from(sample_rate)?;
        let channels = Channels::try_from(channels)?;
        Self::with_config(&EncoderConfig::new(sample_rate, channels, application))
    }

    /// Creates a new VoIP encoder.
    pub fn new_voip(sample_rate: i32, channels: i32) -> Result<Self, OpusError> {
        Self::new(sample_rate, channels, Application::VoIP)
    }

    /// Creates a new audio encoder.
    pub fn new_audio(sample_rate: i32, channels: i32) -> Result<Self, OpusError> {
        Self::new(sample_rate, channels, Application::Audio)
    }

    /// Creates an encoder and applies every setting in `cfg`.
    ///
    /// The configuration is validated before libopus is touched. If a
    /// control call fails after creation the native state is released
    /// before the error is returned.
    pub fn with_config(cfg: &EncoderConfig) -> Result<Self, OpusError> {
        cfg.validate()?;

        let handle = NativeHandle::create(|| {
            let mut error = ffi::OPUS_OK;
            let ptr = unsafe {
                ffi::opus_encoder_create(
                    cfg.sample_rate.hz() as i32,
                    cfg.channels.count() as i32,
                    cfg.application.to_ffi(),
                    &mut error,
                )
            };
            if error != ffi::OPUS_OK {
                return Err(OpusError::native(error));
            }
            Ok(ptr)
        })?;

        let encoder = Self {
            sample_rate: cfg.sample_rate,
            channels: cfg.channels,
            application: cfg.application,
            handle,
        };

        encoder.set_bitrate(cfg.bitrate)?;
        if let Some(complexity) = cfg.complexity {
            encoder.set_complexity(complexity)?;
        }
        if let Some(vbr) = cfg.vbr {
            encoder.set_vbr(vbr)?;
        }
        if let Some(fec) = cfg.inband_fec {
            encoder.set_inband_fec(fec)?;
        }
        if let Some(perc) = cfg.packet_loss_perc {
            encoder.set_packet_loss_perc(perc)?;
        }
        if let Some(dtx) = cfg.dtx {
            encoder.set_dtx(dtx)?;
        }
        if let Some(bw) = cfg.max_bandwidth {
            encoder.set_max_bandwidth(bw)?;
        }
        if let Some(force) = cfg.force_channels {
            encoder.set_force_channels(force)?;
        }

        tracing::debug!(
            sample_rate = cfg.sample_rate.hz(),
            channels = cfg.channels.count(),
            application = ?cfg.application,
            "opus: encoder ready"
        );
        Ok(encoder)
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Returns the channel layout.
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Returns the application the encoder was created with.
    pub fn application(&self) -> Application {
        self.application
    }

    /// Returns the frame geometry for a given duration.
    pub fn frame_geometry(&self, fd: FrameDuration) -> FrameGeometry {
        FrameGeometry::new(fd, self.sample_rate.hz(), self.channels.count())
    }

    /// Returns the frame size (samples per channel) for a given duration.
    pub fn frame_size_for_duration(&self, fd: FrameDuration) -> usize {
        fd.samples_per_channel(self.sample_rate.hz())
    }

    /// Returns the frame size for 20ms frames (recommended default).
    pub fn frame_size_20ms(&self) -> usize {
        self.frame_size_for_duration(FrameDuration::Duration20ms)
    }

    /// Encodes one frame of little-endian 16-bit PCM.
    ///
    /// `pcm_len` bytes of `pcm` are consumed and must form exactly one frame
    /// of a legal duration. At most `max_out` bytes of `out` are written.
    /// Returns the packet length.
    pub fn encode(
        &self,
        pcm: &[u8],
        pcm_len: usize,
        out: &mut [u8],
        max_out: usize,
    ) -> Result<usize, OpusError> {
        self.handle.ensure_valid()?;
        params::check_buffer("pcm", pcm_len, pcm.len())?;
        params::check_buffer("output", max_out, out.len())?;
        let geometry = self.geometry_of(pcm_len)?;

        let pcm = &pcm[..pcm_len];
        let out = &mut out[..max_out];
        match units::le_samples(pcm) {
            Some(samples) => self.encode_raw(samples, &geometry, out),
            None => {
                let mut samples = vec![0i16; geometry.total_samples()];
                units::read_le_samples(pcm, &mut samples);
                self.encode_raw(&samples, &geometry, out)
            }
        }
    }

    /// Encodes one frame of interleaved samples into `out`.
    pub fn encode_samples(&self, pcm: &[i16], out: &mut [u8]) -> Result<usize, OpusError> {
        self.handle.ensure_valid()?;
        let geometry = self.geometry_of(pcm.len() * BYTES_PER_SAMPLE)?;
        self.encode_raw(pcm, &geometry, out)
    }

    fn geometry_of(&self, pcm_bytes: usize) -> Result<FrameGeometry, OpusError> {
        FrameGeometry::from_pcm_len(pcm_bytes, self.sample_rate.hz(), self.channels.count())
    }

    fn encode_raw(
        &self,
        pcm: &[i16],
        geometry: &FrameGeometry,
        out: &mut [u8],
    ) -> Result<usize, OpusError> {
        let max_out = i32::try_from(out.len()).unwrap_or(i32::MAX);
        self.handle.with(|ptr| {
            let n = unsafe {
                ffi::opus_encode(
                    ptr.as_ptr(),
                    pcm.as_ptr(),
                    geometry.samples_per_channel as i32,
                    out.as_mut_ptr(),
                    max_out,
                )
            };
            let n = check(n)?;
            tracing::trace!(frame = %geometry.duration, bytes = n, "opus: encoded");
            Ok(n)
        })
    }

    /// Sets the target bitrate.
    pub fn set_bitrate(&self, bitrate: Bitrate) -> Result<(), OpusError> {
        self.handle.ensure_valid()?;
        let bitrate = bitrate.validate()?;
        self.set_ctl(Ctl::Bitrate, bitrate.to_ffi())
    }

    /// Returns the bitrate. libopus reports the effective rate, so an
    /// encoder set to `Auto` or `Max` answers with `Bits`.
    pub fn bitrate(&self) -> Result<Bitrate, OpusError> {
        Bitrate::from_ffi(self.get_ctl(Ctl::Bitrate)?)
    }

    /// Enables or disables variable bitrate.
    pub fn set_vbr(&self, enabled: bool) -> Result<(), OpusError> {
        self.set_ctl(Ctl::Vbr, enabled as i32)
    }

    pub fn vbr(&self) -> Result<bool, OpusError> {
        params::bool_from_ffi(Ctl::Vbr.name(), self.get_ctl(Ctl::Vbr)?)
    }

    /// Sets the highest bandwidth the encoder may use.
    pub fn set_max_bandwidth(&self, bandwidth: Bandwidth) -> Result<(), OpusError> {
        self.set_ctl(Ctl::MaxBandwidth, bandwidth.to_ffi())
    }

    pub fn max_bandwidth(&self) -> Result<Bandwidth, OpusError> {
        Bandwidth::try_from(self.get_ctl(Ctl::MaxBandwidth)?)
    }

    /// Sets the encoder complexity (0-10).
    pub fn set_complexity(&self, complexity: i32) -> Result<(), OpusError> {
        self.handle.ensure_valid()?;
        let complexity = params::validate_complexity(complexity)?;
        self.set_ctl(Ctl::Complexity, complexity)
    }

    pub fn complexity(&self) -> Result<i32, OpusError> {
        self.get_ctl(Ctl::Complexity)
    }

    /// Enables or disables in-band forward error correction.
    pub fn set_inband_fec(&self, enabled: bool) -> Result<(), OpusError> {
        self.set_ctl(Ctl::InbandFec, enabled as i32)
    }

    pub fn inband_fec(&self) -> Result<bool, OpusError> {
        params::bool_from_ffi(Ctl::InbandFec.name(), self.get_ctl(Ctl::InbandFec)?)
    }

    /// Sets the expected packet loss percentage (0-100).
    pub fn set_packet_loss_perc(&self, perc: i32) -> Result<(), OpusError> {
        self.handle.ensure_valid()?;
        let perc = params::validate_packet_loss_perc(perc)?;
        self.set_ctl(Ctl::PacketLossPerc, perc)
    }

    pub fn packet_loss_perc(&self) -> Result<i32, OpusError> {
        self.get_ctl(Ctl::PacketLossPerc)
    }

    /// Enables or disables discontinuous transmission.
    pub fn set_dtx(&self, enabled: bool) -> Result<(), OpusError> {
        self.set_ctl(Ctl::Dtx, enabled as i32)
    }

    pub fn dtx(&self) -> Result<bool, OpusError> {
        params::bool_from_ffi(Ctl::Dtx.name(), self.get_ctl(Ctl::Dtx)?)
    }

    /// Forces mono or stereo coding regardless of the input layout.
    pub fn set_force_channels(&self, force: ForceChannels) -> Result<(), OpusError> {
        self.set_ctl(Ctl::ForceChannels, force.to_ffi())
    }

    pub fn force_channels(&self) -> Result<ForceChannels, OpusError> {
        ForceChannels::try_from(self.get_ctl(Ctl::ForceChannels)?)
    }

    /// Returns the encoder lookahead in samples per channel.
    pub fn lookahead(&self) -> Result<usize, OpusError> {
        Ok(self.get_ctl(Ctl::Lookahead)?.max(0) as usize)
    }

    /// Resets the codec state as if freshly created. Settings are kept.
    pub fn reset(&self) -> Result<(), OpusError> {
        self.handle.with(|ptr| {
            let ret = unsafe { ffi::opus_encoder_ctl(ptr.as_ptr(), ffi::OPUS_RESET_STATE) };
            check(ret).map(|_| ())
        })
    }

    /// Releases the native encoder. Safe to call repeatedly and from
    /// several threads; only the first call has an effect.
    pub fn dispose(&self) {
        self.handle.release();
    }

    /// Returns true once the encoder has been disposed.
    pub fn is_disposed(&self) -> bool {
        !self.handle.is_valid()
    }

    fn set_ctl(&self, ctl: Ctl, value: i32) -> Result<(), OpusError> {
        let request = ctl
            .set_request()
            .ok_or_else(|| OpusError::native(ffi::OPUS_UNIMPLEMENTED))?;
        self.handle.with(|ptr| {
            tracing::trace!(ctl = ctl.name(), value, "opus: encoder set");
            let ret = unsafe { ffi::opus_encoder_ctl(ptr.as_ptr(), request, value) };
            check(ret).map(|_| ())
        })
    }

    fn get_ctl(&self, ctl: Ctl) -> Result<i32, OpusError> {
        self.handle.with(|ptr| {
            let mut value: i32 = 0;
            let ret = unsafe {
                ffi::opus_encoder_ctl(ptr.as_ptr(), ctl.get_request(), &mut value as *mut i32)
            };
            check(ret)?;
            tracing::trace!(ctl = ctl.name(), value, "opus: encoder get");
            Ok(value)
        })
    }
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("application", &self.application)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
