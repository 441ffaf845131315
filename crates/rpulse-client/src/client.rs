use std::sync::Arc;

use dashmap::DashMap;
use rpulse_proto::{Event, Reply, Request, StreamIndex, Transport};

use crate::playback::{Callback, PlaybackOption, PlaybackStream, StreamShared};
use crate::Result;

/// A connection to an audio server and the streams created through it.
///
/// Cloning is cheap, all clones share the connection and stream registry.
pub struct Client<T: Transport> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    transport: T,
    playback: DashMap<StreamIndex, Arc<StreamShared>>,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Client<T> {
        Client {
            inner: Arc::new(Inner {
                transport,
                playback: DashMap::default(),
            }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Creates a playback stream fed by `callback`.
    ///
    /// The stream starts out corked and must be started with
    /// [`PlaybackStream::start`]. Options are applied in order, see
    /// [`PlaybackOption`].
    pub fn new_playback<I>(&self, callback: Callback, options: I) -> Result<PlaybackStream<T>>
    where
        I: IntoIterator<Item = PlaybackOption>,
    {
        PlaybackStream::create(self.clone(), callback, options)
    }

    /// Sends an arbitrary request, e.g. one addressed to
    /// [`PlaybackStream::stream_index`].
    pub fn raw_request(&self, request: Request) -> Result<Reply> {
        Ok(self.inner.transport.request(request)?)
    }

    /// Dispatches server events until the connection closes.
    pub fn handle(&self) -> Result<()> {
        loop {
            let event = match self.inner.transport.recv_event() {
                Ok(v) => v,
                Err(rpulse_proto::Error::Disconnected) => return Ok(()),
                Err(e) => return Err(e.into()),
            };

            self.handle_event(event);
        }
    }

    pub fn handle_event(&self, event: Event) {
        let index = event.stream_index();

        let Some(stream) = self
            .inner
            .playback
            .get(&index)
            .map(|entry| entry.value().clone())
        else {
            tracing::debug!(stream = %index, ?event, "event for unknown stream");
            return;
        };

        match event {
            Event::Request { length, .. } => {
                tracing::trace!(stream = %index, length, "server requested data");

                let transport = &self.inner.transport;
                let res = stream.feed(length as usize, |buf| transport.send(index, buf));
                if let Err(error) = res {
                    tracing::warn!(stream = %index, %error, "failed to send requested data");
                }
            }
            Event::Underflow { .. } => {
                tracing::trace!(stream = %index, "underflow");
                stream.mark_underflow();
            }
            Event::PlaybackStreamKilled { .. } => {
                tracing::debug!(stream = %index, "playback stream killed by server");
                stream.mark_killed();
                self.unregister(&stream);
            }
        }
    }

    pub fn num_playback_streams(&self) -> usize {
        self.inner.playback.len()
    }

    pub(crate) fn register(&self, stream: Arc<StreamShared>) {
        self.inner.playback.insert(stream.index(), stream);
    }

    /// Removes `stream` from the registry unless its index was already
    /// handed to a newer stream.
    pub(crate) fn unregister(&self, stream: &Arc<StreamShared>) {
        self.inner
            .playback
            .remove_if(&stream.index(), |_, entry| Arc::ptr_eq(entry, stream));
    }
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Client {
            inner: self.inner.clone(),
        }
    }
}
