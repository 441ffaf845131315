use std::fmt;
use std::time::Duration;

use rpulse_proto::{
    ChannelMap, ChannelPosition, CreatePlaybackStream, Properties, SampleFormat, SampleSpec,
    CHANNELS_MAX, UNDEFINED, VOLUME_NORM,
};
use smallvec::smallvec;

use crate::{Error, Result, Sink};

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

pub const PROP_MEDIA_NAME: &str = "media.name";
pub const PROP_MEDIA_ICON_NAME: &str = "media.icon_name";

/// One step of stream configuration.
///
/// Options are applied in order and some of them read what earlier ones set:
/// [`PlaybackOption::Latency`] and [`PlaybackOption::LowLatency`] derive a byte
/// length from the sample rate and channel count, so they belong after
/// [`PlaybackOption::SampleRate`] and the channel options.
///
/// Buffer size and latency should not be combined, whichever comes last wins.
pub enum PlaybackOption {
    Mono,
    Stereo,
    Channels(ChannelMap),
    SampleRate(u32),
    /// Server-side buffer length in samples. Disables latency adjustment.
    BufferSize(u32),
    /// Target latency in seconds. Enables latency adjustment.
    Latency(f64),
    Sink(u32),
    /// Plays on a sink at the lowest latency the server considers safe for it.
    LowLatency {
        sink_index: u32,
        latency: Duration,
    },
    Property {
        key: String,
        value: String,
    },
    Raw(RawOption),
}

impl PlaybackOption {
    pub fn channels<I>(positions: I) -> PlaybackOption
    where
        I: IntoIterator<Item = ChannelPosition>,
    {
        PlaybackOption::Channels(positions.into_iter().collect())
    }

    pub fn sink(sink: &Sink) -> PlaybackOption {
        PlaybackOption::Sink(sink.index())
    }

    pub fn low_latency(sink: &Sink) -> PlaybackOption {
        PlaybackOption::LowLatency {
            sink_index: sink.index(),
            latency: sink.requested_latency(),
        }
    }

    /// Name shown by volume control applications.
    pub fn media_name(name: impl Into<String>) -> PlaybackOption {
        PlaybackOption::property(PROP_MEDIA_NAME, name)
    }

    /// XDG icon name shown by volume control applications.
    pub fn media_icon_name(name: impl Into<String>) -> PlaybackOption {
        PlaybackOption::property(PROP_MEDIA_ICON_NAME, name)
    }

    pub fn property(key: impl Into<String>, value: impl Into<String>) -> PlaybackOption {
        PlaybackOption::Property {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Edits the creation request directly, for settings without an option.
    pub fn raw<F>(func: F) -> PlaybackOption
    where
        F: FnOnce(&mut CreatePlaybackStream) + Send + 'static,
    {
        PlaybackOption::Raw(RawOption(Box::new(func)))
    }
}

impl fmt::Debug for PlaybackOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackOption::Mono => f.write_str("Mono"),
            PlaybackOption::Stereo => f.write_str("Stereo"),
            PlaybackOption::Channels(map) => f.debug_tuple("Channels").field(map).finish(),
            PlaybackOption::SampleRate(rate) => f.debug_tuple("SampleRate").field(rate).finish(),
            PlaybackOption::BufferSize(size) => f.debug_tuple("BufferSize").field(size).finish(),
            PlaybackOption::Latency(secs) => f.debug_tuple("Latency").field(secs).finish(),
            PlaybackOption::Sink(index) => f.debug_tuple("Sink").field(index).finish(),
            PlaybackOption::LowLatency {
                sink_index,
                latency,
            } => f
                .debug_struct("LowLatency")
                .field("sink_index", sink_index)
                .field("latency", latency)
                .finish(),
            PlaybackOption::Property { key, value } => f
                .debug_struct("Property")
                .field("key", key)
                .field("value", value)
                .finish(),
            PlaybackOption::Raw(_) => f.write_str("Raw(..)"),
        }
    }
}

pub struct RawOption(Box<dyn FnOnce(&mut CreatePlaybackStream) + Send + 'static>);

/// Accumulates the creation request for a playback stream.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    request: CreatePlaybackStream,
    bytes_per_sample: usize,
}

impl PlaybackConfig {
    pub fn new(format: SampleFormat) -> PlaybackConfig {
        PlaybackConfig {
            request: CreatePlaybackStream {
                sample_spec: SampleSpec {
                    format,
                    channels: 1,
                    rate: DEFAULT_SAMPLE_RATE,
                },
                channel_map: smallvec![ChannelPosition::Mono],
                sink_index: UNDEFINED,
                sink_name: None,
                buffer_max_length: UNDEFINED,
                corked: true,
                buffer_target_length: UNDEFINED,
                buffer_prebuffer_length: UNDEFINED,
                buffer_minimum_request: UNDEFINED,
                channel_volumes: None,
                muted: false,
                adjust_latency: false,
                early_requests: false,
                properties: Properties::default(),
            },
            bytes_per_sample: format.sample_size(),
        }
    }

    pub fn request(&self) -> &CreatePlaybackStream {
        &self.request
    }

    pub fn apply_all<I>(&mut self, options: I) -> Result<()>
    where
        I: IntoIterator<Item = PlaybackOption>,
    {
        for option in options {
            self.apply(option)?;
        }

        Ok(())
    }

    pub fn apply(&mut self, option: PlaybackOption) -> Result<()> {
        let req = &mut self.request;

        match option {
            PlaybackOption::Mono => {
                req.channel_map = smallvec![ChannelPosition::Mono];
                req.sample_spec.channels = 1;
            }
            PlaybackOption::Stereo => {
                req.channel_map = smallvec![ChannelPosition::FL, ChannelPosition::FR];
                req.sample_spec.channels = 2;
            }
            PlaybackOption::Channels(map) => {
                check_channel_map(&map)?;
                req.sample_spec.channels = map.len() as u8;
                req.channel_map = map;
            }
            PlaybackOption::SampleRate(rate) => {
                req.sample_spec.rate = rate;
            }
            PlaybackOption::BufferSize(samples) => {
                req.buffer_target_length = byte_length(&[samples, self.bytes_per_sample as u32])?;
                req.adjust_latency = false;
            }
            PlaybackOption::Latency(seconds) => {
                let frames = (seconds * f64::from(req.sample_spec.rate)).round() as u32;
                self.set_latency_frames(frames)?;
            }
            PlaybackOption::Sink(index) => {
                req.sink_index = index;
            }
            PlaybackOption::LowLatency {
                sink_index,
                latency,
            } => {
                req.sink_index = sink_index;
                let frames = latency
                    .as_micros()
                    .saturating_mul(u128::from(req.sample_spec.rate))
                    / 1_000_000;
                self.set_latency_frames(u32::try_from(frames).unwrap_or(u32::MAX))?;
            }
            PlaybackOption::Property { key, value } => {
                req.properties.insert(key, value);
            }
            PlaybackOption::Raw(RawOption(func)) => func(req),
        }

        Ok(())
    }

    /// Completes the request, filling in a unity volume when none was set.
    pub fn finish(mut self) -> Result<CreatePlaybackStream> {
        check_channel_map(&self.request.channel_map)?;

        if self.request.channel_volumes.is_none() {
            let channels = self.request.channel_map.len();
            self.request.channel_volumes = Some(smallvec![VOLUME_NORM; channels]);
        }

        Ok(self.request)
    }

    fn set_latency_frames(&mut self, frames: u32) -> Result<()> {
        let req = &mut self.request;
        let channels = u32::from(req.sample_spec.channels);
        let target = byte_length(&[frames, channels, self.bytes_per_sample as u32])?;
        let max = byte_length(&[target, 2])?;

        req.buffer_target_length = target;
        req.buffer_max_length = max;
        req.adjust_latency = true;

        Ok(())
    }
}

/// Multiplies out a buffer length, keeping clear of [`UNDEFINED`].
fn byte_length(factors: &[u32]) -> Result<u32> {
    factors
        .iter()
        .try_fold(1u32, |acc, &factor| acc.checked_mul(factor))
        .filter(|&len| len != UNDEFINED)
        .ok_or(Error::BufferTooLarge)
}

fn check_channel_map(map: &ChannelMap) -> Result<()> {
    if map.is_empty() {
        return Err(Error::EmptyChannelMap);
    }

    if map.len() > CHANNELS_MAX {
        return Err(Error::TooManyChannels);
    }

    Ok(())
}
