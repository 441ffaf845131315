mod client;
mod error;
pub mod playback;
mod sink;

pub use rpulse_proto as proto;

pub use self::client::Client;
pub use self::error::{Error, Result};
pub use self::playback::{
    Callback, CallbackError, Outcome, PlaybackConfig, PlaybackOption, PlaybackStream, Sample,
    StreamError,
};
pub use self::sink::Sink;
