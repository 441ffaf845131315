use rpulse_proto::SampleFormat;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("unsupported callback sample format: {0:?}")]
    UnsupportedFormat(SampleFormat),

    #[error("invalid channel map: no channels")]
    EmptyChannelMap,

    #[error("too many channels")]
    TooManyChannels,

    #[error("buffer length does not fit the protocol")]
    BufferTooLarge,

    #[error("stream is closed")]
    Closed,

    #[error(transparent)]
    Protocol(#[from] rpulse_proto::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
