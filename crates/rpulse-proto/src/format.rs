use smallvec::SmallVec;

/// Maximum number of channels a stream may carry.
pub const CHANNELS_MAX: usize = 32;

/// Per-channel volume that leaves samples unchanged.
pub const VOLUME_NORM: u32 = 0x100;

pub type ChannelMap = SmallVec<[ChannelPosition; 8]>;
pub type ChannelVolumes = SmallVec<[u32; 8]>;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum SampleFormat {
    U8,
    Alaw,
    Ulaw,
    S16Le,
    S16Be,
    F32Le,
    F32Be,
    S32Le,
    S32Be,
    S24Le,
    S24Be,
    S24In32Le,
    S24In32Be,
}

impl SampleFormat {
    #[cfg(target_endian = "little")]
    pub const S16NE: SampleFormat = SampleFormat::S16Le;
    #[cfg(target_endian = "big")]
    pub const S16NE: SampleFormat = SampleFormat::S16Be;

    #[cfg(target_endian = "little")]
    pub const S32NE: SampleFormat = SampleFormat::S32Le;
    #[cfg(target_endian = "big")]
    pub const S32NE: SampleFormat = SampleFormat::S32Be;

    #[cfg(target_endian = "little")]
    pub const F32NE: SampleFormat = SampleFormat::F32Le;
    #[cfg(target_endian = "big")]
    pub const F32NE: SampleFormat = SampleFormat::F32Be;

    /// Width of one sample of one channel, in bytes.
    pub fn sample_size(self) -> usize {
        match self {
            SampleFormat::U8 | SampleFormat::Alaw | SampleFormat::Ulaw => 1,
            SampleFormat::S16Le | SampleFormat::S16Be => 2,
            SampleFormat::S24Le | SampleFormat::S24Be => 3,
            SampleFormat::F32Le
            | SampleFormat::F32Be
            | SampleFormat::S32Le
            | SampleFormat::S32Be
            | SampleFormat::S24In32Le
            | SampleFormat::S24In32Be => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SampleSpec {
    pub format: SampleFormat,
    pub channels: u8,
    pub rate: u32,
}

impl SampleSpec {
    pub fn frame_size(&self) -> usize {
        self.format.sample_size() * usize::from(self.channels)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum ChannelPosition {
    Mono,
    FL,
    FR,
    FC,
    RC,
    RL,
    RR,
    LFE,
    FLC,
    FRC,
    SL,
    SR,
    Aux(u8),
    TC,
    TFL,
    TFR,
    TFC,
    TRL,
    TRR,
    TRC,
}
