//! Opus decoder.

use std::fmt;
use std::ptr;

use crate::config::DecoderConfig;
use crate::ctl::Ctl;
use crate::error::{check, OpusError};
use crate::ffi::{self, OpusDecoder as OpusDecoderHandle};
use crate::handle::NativeHandle;
use crate::params::{self, Bandwidth, Channels, SampleRate};
use crate::units::{self, FrameGeometry, BYTES_PER_SAMPLE};

/// Opus decoder.
///
/// Output PCM length selects the frame duration: every decode call is
/// given exactly one legal frame worth of output space. When a packet is
/// lost, pass `None` as input and the decoder synthesizes that much audio,
/// using forward error correction data if the encoder provided it.
pub struct Decoder {
    sample_rate: SampleRate,
    channels: Channels,
    default_frame: FrameGeometry,
    handle: NativeHandle<OpusDecoderHandle>,
}

impl Decoder {
    /// Creates a new Opus decoder.
    ///
    /// # Parameters
    /// - `sample_rate`: Sample rate to decode at (8000, 12000, 16000, 24000, or 48000)
    /// - `channels`: Number of channels (1 or 2)
    pub fn new(sample_rate: i32, channels: i32) -> Result<Self, OpusError> {
        let sample_rate = SampleRate::try_from(sample_rate)?;
        let channels = Channels::try_from(channels)?;
        Self::with_config(&DecoderConfig::new(sample_rate, channels))
    }

    /// Creates a decoder from a configuration.
    pub fn with_config(cfg: &DecoderConfig) -> Result<Self, OpusError> {
        cfg.validate()?;

        let handle = NativeHandle::create(|| {
            let mut error = ffi::OPUS_OK;
            let ptr = unsafe {
                ffi::opus_decoder_create(
                    cfg.sample_rate.hz() as i32,
                    cfg.channels.count() as i32,
                    &mut error,
                )
            };
            if error != ffi::OPUS_OK {
                return Err(OpusError::native(error));
            }
            Ok(ptr)
        })?;

        let decoder = Self {
            sample_rate: cfg.sample_rate,
            channels: cfg.channels,
            default_frame: FrameGeometry::new(
                cfg.frame_duration,
                cfg.sample_rate.hz(),
                cfg.channels.count(),
            ),
            handle,
        };

        if let Some(gain) = cfg.gain {
            decoder.set_gain(gain)?;
        }

        tracing::debug!(
            sample_rate = cfg.sample_rate.hz(),
            channels = cfg.channels.count(),
            frame = %cfg.frame_duration,
            "opus: decoder ready"
        );
        Ok(decoder)
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Returns the channel layout.
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Returns the frame used by [`decode_frame`](Self::decode_frame) and
    /// [`conceal`](Self::conceal).
    pub fn default_frame(&self) -> FrameGeometry {
        self.default_frame
    }

    /// Decodes into little-endian 16-bit PCM.
    ///
    /// With `Some(input)`, the first `input_len` bytes are decoded as one
    /// packet. With `None` the packet is treated as lost and replacement
    /// audio is synthesized. `max_pcm` must be the byte length of a legal
    /// frame and bounds the output. Returns the number of bytes written.
    pub fn decode(
        &self,
        input: Option<&[u8]>,
        input_len: usize,
        pcm: &mut [u8],
        max_pcm: usize,
    ) -> Result<usize, OpusError> {
        self.handle.ensure_valid()?;
        if let Some(data) = input {
            params::check_buffer("input", input_len, data.len())?;
        }
        params::check_buffer("pcm", max_pcm, pcm.len())?;
        let geometry = self.geometry_of(max_pcm)?;

        let data = input.map(|d| &d[..input_len]);
        let loss = data.is_none();
        let channels = self.channels.count() as usize;
        let pcm = &mut pcm[..max_pcm];
        let decoded = match units::le_samples_mut(pcm) {
            Some(samples) => self.decode_raw(data, samples, &geometry, loss)?,
            None => {
                let mut samples = vec![0i16; geometry.total_samples()];
                let n = self.decode_raw(data, &mut samples, &geometry, loss)?;
                units::write_le_samples(&samples[..n * channels], pcm);
                n
            }
        };
        Ok(decoded * channels * BYTES_PER_SAMPLE)
    }

    /// Decodes into interleaved samples; `out` must hold exactly one legal
    /// frame. With `fec` set and a packet present, the forward error
    /// correction data carried in that packet is decoded instead, recovering
    /// the packet before it. Returns samples per channel.
    pub fn decode_samples(
        &self,
        input: Option<&[u8]>,
        out: &mut [i16],
        fec: bool,
    ) -> Result<usize, OpusError> {
        self.handle.ensure_valid()?;
        let geometry = self.geometry_of(out.len() * BYTES_PER_SAMPLE)?;
        self.decode_raw(input, out, &geometry, fec || input.is_none())
    }

    fn geometry_of(&self, pcm_bytes: usize) -> Result<FrameGeometry, OpusError> {
        FrameGeometry::from_pcm_len(pcm_bytes, self.sample_rate.hz(), self.channels.count())
    }

    /// Decodes one packet into a default-sized frame.
    pub fn decode_frame(&self, input: &[u8], pcm: &mut [u8]) -> Result<usize, OpusError> {
        self.decode(Some(input), input.len(), pcm, self.default_frame.pcm_bytes)
    }

    /// Synthesizes one default-sized frame for a lost packet.
    pub fn conceal(&self, pcm: &mut [u8]) -> Result<usize, OpusError> {
        self.decode(None, 0, pcm, self.default_frame.pcm_bytes)
    }

    fn decode_raw(
        &self,
        input: Option<&[u8]>,
        out: &mut [i16],
        geometry: &FrameGeometry,
        loss: bool,
    ) -> Result<usize, OpusError> {
        let (data_ptr, data_len) = match input {
            Some(data) => (data.as_ptr(), i32::try_from(data.len()).unwrap_or(i32::MAX)),
            None => (ptr::null(), 0),
        };

        self.handle.with(|handle| {
            let n = unsafe {
                ffi::opus_decode(
                    handle.as_ptr(),
                    data_ptr,
                    data_len,
                    out.as_mut_ptr(),
                    geometry.samples_per_channel as i32,
                    loss as i32,
                )
            };
            let n = check(n)?;
            tracing::trace!(
                frame = %geometry.duration,
                samples = n,
                loss,
                "opus: decoded"
            );
            Ok(n)
        })
    }

    /// Sets the output gain in Q8 dB.
    pub fn set_gain(&self, gain: i32) -> Result<(), OpusError> {
        self.handle.ensure_valid()?;
        let gain = params::validate_gain(gain)?;
        self.set_ctl(Ctl::Gain, gain)
    }

    pub fn gain(&self) -> Result<i32, OpusError> {
        self.get_ctl(Ctl::Gain)
    }

    /// Samples per channel produced by the last decode call.
    pub fn last_packet_duration(&self) -> Result<usize, OpusError> {
        Ok(self.get_ctl(Ctl::LastPacketDuration)?.max(0) as usize)
    }

    /// Bandwidth of the last decoded packet, `None` before the first one.
    pub fn bandwidth(&self) -> Result<Option<Bandwidth>, OpusError> {
        match self.get_ctl(Ctl::Bandwidth)? {
            0 => Ok(None),
            v => Bandwidth::try_from(v).map(Some),
        }
    }

    /// Resets the decoder state, dropping any loss-concealment history.
    pub fn reset(&self) -> Result<(), OpusError> {
        self.handle.with(|ptr| {
            let ret = unsafe { ffi::opus_decoder_ctl(ptr.as_ptr(), ffi::OPUS_RESET_STATE) };
            check(ret).map(|_| ())
        })
    }

    /// Releases the native decoder. Idempotent and safe to race.
    pub fn dispose(&self) {
        self.handle.release();
    }

    /// Returns true once the decoder has been disposed.
    pub fn is_disposed(&self) -> bool {
        !self.handle.is_valid()
    }

    fn set_ctl(&self, ctl: Ctl, value: i32) -> Result<(), OpusError> {
        let request = ctl
            .set_request()
            .ok_or_else(|| OpusError::native(ffi::OPUS_UNIMPLEMENTED))?;
        self.handle.with(|ptr| {
            tracing::trace!(ctl = ctl.name(), value, "opus: decoder set");
            let ret = unsafe { ffi::opus_decoder_ctl(ptr.as_ptr(), request, value) };
            check(ret).map(|_| ())
        })
    }

    fn get_ctl(&self, ctl: Ctl) -> Result<i32, OpusError> {
        self.handle.with(|ptr| {
            let mut value: i32 = 0;
            let ret = unsafe {
                ffi::opus_decoder_ctl(ptr.as_ptr(), ctl.get_request(), &mut value as *mut i32)
            };
            check(ret)?;
            Ok(value)
        })
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("default_frame", &self.default_frame.duration)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
