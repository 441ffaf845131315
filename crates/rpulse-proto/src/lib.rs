mod command;
mod error;
mod format;
pub mod transport;

pub use self::command::{
    CreatePlaybackStream, CreatePlaybackStreamReply, Event, Properties, Reply, Request,
};
pub use self::error::{Error, ErrorCode, Result};
pub use self::format::{
    ChannelMap, ChannelPosition, ChannelVolumes, SampleFormat, SampleSpec, CHANNELS_MAX,
    VOLUME_NORM,
};
pub use self::transport::Transport;

/// Value the server interprets as "choose for me".
pub const UNDEFINED: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct StreamIndex(pub u32);

impl From<u32> for StreamIndex {
    fn from(value: u32) -> Self {
        StreamIndex(value)
    }
}

impl std::fmt::Display for StreamIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}
