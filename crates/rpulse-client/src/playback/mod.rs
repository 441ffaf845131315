mod callback;
mod config;
mod pump;
mod state;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use rpulse_proto::{Request, SampleFormat, SampleSpec, StreamIndex, Transport};

pub use self::callback::{Callback, CallbackError, Outcome, Sample, StreamError};
pub use self::config::{
    PlaybackConfig, PlaybackOption, RawOption, DEFAULT_SAMPLE_RATE, PROP_MEDIA_ICON_NAME,
    PROP_MEDIA_NAME,
};
pub(crate) use self::state::StreamShared;
use crate::{Client, Error, Result};

/// An outbound audio stream.
///
/// Audio is produced by the stream's [`Callback`]: once when the stream is
/// started and then whenever the server asks for more, as dispatched by
/// [`Client::handle`].
pub struct PlaybackStream<T: Transport> {
    client: Option<Client<T>>,
    shared: Arc<StreamShared>,
    sample_spec: SampleSpec,
    bytes_per_sample: usize,
    buffer_target_length: u32,
    buffer_max_length: u32,
    sink_index: u32,
}

impl<T: Transport> PlaybackStream<T> {
    pub(crate) fn create<I>(
        client: Client<T>,
        callback: Callback,
        options: I,
    ) -> Result<PlaybackStream<T>>
    where
        I: IntoIterator<Item = PlaybackOption>,
    {
        let mut config = PlaybackConfig::new(callback.format());
        config.apply_all(options)?;
        let request = config.finish()?;

        let reply = client
            .transport()
            .request(Request::CreatePlaybackStream(Box::new(request)))?
            .into_create_playback_stream()?;

        tracing::debug!(
            stream = %reply.stream_index,
            rate = reply.sample_spec.rate,
            channels = reply.sample_spec.channels,
            target_length = reply.buffer_target_length,
            "created playback stream",
        );

        let bytes_per_sample = callback.bytes_per_sample();
        let shared = Arc::new(StreamShared::new(reply.stream_index, callback));
        client.register(shared.clone());

        Ok(PlaybackStream {
            client: Some(client),
            shared,
            sample_spec: reply.sample_spec,
            bytes_per_sample,
            buffer_target_length: reply.buffer_target_length,
            buffer_max_length: reply.buffer_max_length,
            sink_index: reply.sink_index,
        })
    }

    /// Discards stale server-side audio, primes the buffer and uncorks.
    ///
    /// If the callback ends the stream on the first buffer the stream is never
    /// uncorked; check [`ended`](Self::ended) and [`error`](Self::error).
    pub fn start(&mut self) -> Result<()> {
        let index = self.stream_index();
        let client = self.client()?;

        self.request(Request::FlushPlaybackStream {
            stream_index: index,
        })?;

        self.shared.state().ended = false;

        let len = self.buffer_target_length as usize;
        let fed = self
            .shared
            .feed(len, |buf| client.transport().send(index, buf))?;

        if !fed {
            tracing::debug!(stream = %index, "stream ended before it was started");
            return Ok(());
        }

        self.request(Request::CorkPlaybackStream {
            stream_index: index,
            corked: false,
        })?;

        let mut state = self.shared.state();
        state.running = true;
        state.underflow = false;

        tracing::debug!(stream = %index, "started playback stream");

        Ok(())
    }

    /// Stops calling the callback.
    ///
    /// Audio the server has already buffered keeps playing; use
    /// [`pause`](Self::pause) to silence the stream immediately.
    pub fn stop(&self) {
        self.shared.state().ended = true;
    }

    /// Corks the stream, silencing it immediately.
    pub fn pause(&mut self) -> Result<()> {
        self.request(Request::CorkPlaybackStream {
            stream_index: self.stream_index(),
            corked: true,
        })?;

        self.shared.state().running = false;
        tracing::debug!(stream = %self.stream_index(), "paused playback stream");

        Ok(())
    }

    /// Uncorks a paused stream. Does nothing once the stream has ended.
    pub fn resume(&mut self) -> Result<()> {
        self.client()?;

        if self.shared.state().ended {
            return Ok(());
        }

        self.request(Request::CorkPlaybackStream {
            stream_index: self.stream_index(),
            corked: false,
        })?;

        let mut state = self.shared.state();
        state.running = true;
        state.underflow = false;

        tracing::debug!(stream = %self.stream_index(), "resumed playback stream");

        Ok(())
    }

    /// Blocks until the server has played everything it buffered.
    ///
    /// Returns immediately when the stream is not running, since a corked
    /// stream never drains. Blocks forever if the callback never ends the
    /// stream.
    pub fn drain(&self) -> Result<()> {
        self.client()?;

        if !self.shared.state().running {
            return Ok(());
        }

        tracing::debug!(stream = %self.stream_index(), "draining playback stream");

        self.request(Request::DrainPlaybackStream {
            stream_index: self.stream_index(),
        })
    }

    /// Deletes the stream on the server.
    ///
    /// The stream is closed afterwards even if the request fails.
    pub fn close(&mut self) -> Result<()> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };

        let index = self.stream_index();
        client.unregister(&self.shared);

        let killed = {
            let mut state = self.shared.state();
            let killed = state.closed;
            state.running = false;
            state.ended = true;
            state.closed = true;
            killed
        };

        // A killed stream no longer exists on the server.
        if killed {
            return Ok(());
        }

        tracing::debug!(stream = %index, "closing playback stream");

        let request = Request::DeletePlaybackStream {
            stream_index: index,
        };
        let name = request.name();
        client.transport().request(request)?.into_ack(name)?;

        Ok(())
    }

    pub fn closed(&self) -> bool {
        self.client.is_none() || self.shared.state().closed
    }

    pub fn running(&self) -> bool {
        self.shared.state().running
    }

    /// Whether the callback will no longer be called.
    pub fn ended(&self) -> bool {
        self.shared.state().ended
    }

    /// Whether the server ran out of data since the last start or resume.
    pub fn underflow(&self) -> bool {
        self.shared.state().underflow
    }

    /// The last error returned by the callback.
    pub fn error(&self) -> Option<StreamError> {
        self.shared.state().last_error.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_spec.rate
    }

    pub fn channels(&self) -> usize {
        usize::from(self.sample_spec.channels)
    }

    pub fn format(&self) -> SampleFormat {
        self.sample_spec.format
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bytes_per_sample
    }

    /// Server-side buffer size in samples per channel.
    pub fn buffer_size(&self) -> usize {
        let frame_size = self.channels() * self.bytes_per_sample;
        self.buffer_size_bytes() / frame_size.max(1)
    }

    pub fn buffer_size_bytes(&self) -> usize {
        self.buffer_target_length as usize
    }

    pub fn buffer_max_length(&self) -> usize {
        self.buffer_max_length as usize
    }

    pub fn sink_index(&self) -> u32 {
        self.sink_index
    }

    /// Index for use with [`Client::raw_request`].
    pub fn stream_index(&self) -> StreamIndex {
        self.shared.index()
    }

    fn client(&self) -> Result<&Client<T>> {
        match &self.client {
            Some(client) if !self.shared.state().closed => Ok(client),
            _ => Err(Error::Closed),
        }
    }

    fn request(&self, request: Request) -> Result<()> {
        let name = request.name();
        self.client()?.transport().request(request)?.into_ack(name)?;
        Ok(())
    }
}

impl<T: Transport> Drop for PlaybackStream<T> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            tracing::debug!(%error, "failed to close playback stream");
        }
    }
}
