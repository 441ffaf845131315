use std::sync::{Mutex, MutexGuard, PoisonError};

use rpulse_proto::StreamIndex;

use super::callback::{Callback, StreamError};
use super::pump::BufferPump;

#[derive(Debug, Default)]
pub(crate) struct StreamState {
    pub running: bool,
    pub ended: bool,
    pub underflow: bool,
    pub closed: bool,
    pub last_error: Option<StreamError>,
}

/// The part of a stream the client's event loop can reach.
///
/// Lock order is pump, then state.
pub(crate) struct StreamShared {
    index: StreamIndex,
    state: Mutex<StreamState>,
    pump: Mutex<BufferPump>,
}

impl StreamShared {
    pub fn new(index: StreamIndex, callback: Callback) -> StreamShared {
        StreamShared {
            index,
            // Nothing is fed until the stream is started.
            state: Mutex::new(StreamState {
                ended: true,
                ..StreamState::default()
            }),
            pump: Mutex::new(BufferPump::new(callback)),
        }
    }

    pub fn index(&self) -> StreamIndex {
        self.index
    }

    pub fn state(&self) -> MutexGuard<'_, StreamState> {
        lock(&self.state)
    }

    /// Pumps `len` bytes and hands them to `send`.
    ///
    /// Returns `Ok(false)` without calling `send` when the stream has ended.
    pub fn feed<E>(
        &self,
        len: usize,
        send: impl FnOnce(&[u8]) -> Result<(), E>,
    ) -> Result<bool, E> {
        let mut pump = lock(&self.pump);
        let Some(buf) = pump.fill(len, &self.state) else {
            return Ok(false);
        };

        send(buf)?;
        Ok(true)
    }

    pub fn mark_underflow(&self) {
        self.state().underflow = true;
    }

    pub fn mark_killed(&self) {
        let mut state = self.state();
        state.running = false;
        state.ended = true;
        state.closed = true;
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
