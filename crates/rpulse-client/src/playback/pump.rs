use std::mem::size_of;
use std::sync::{Arc, Mutex};

use super::callback::{Callback, Outcome};
use super::state::{lock, StreamState};

pub(crate) struct BufferPump {
    callback: Callback,
    // Stored as words so the byte view is aligned for every sample type.
    words: Vec<u32>,
}

impl BufferPump {
    pub fn new(callback: Callback) -> BufferPump {
        BufferPump {
            callback,
            words: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.words.len() * size_of::<u32>()
    }

    /// Runs the callback over the first `len` bytes of the buffer.
    ///
    /// Returns `None` once the stream has ended, recording why in `state`.
    /// The callback is never invoked for an ended stream.
    pub fn fill(&mut self, len: usize, state: &Mutex<StreamState>) -> Option<&[u8]> {
        if lock(state).ended {
            return None;
        }

        let words = len.div_ceil(size_of::<u32>());
        if words > self.words.len() {
            self.words = vec![0; words];
            tracing::trace!(capacity = self.capacity(), "grew playback buffer");
        }

        let buf = &mut bytemuck::cast_slice_mut::<u32, u8>(&mut self.words)[..len];

        match self.callback.call(buf) {
            Outcome::Continue => Some(&*buf),
            Outcome::EndOfData => {
                tracing::debug!("callback signalled end of data");
                lock(state).ended = true;
                None
            }
            Outcome::Failed(error) => {
                tracing::warn!(%error, "callback failed, ending stream");
                let mut state = lock(state);
                state.last_error = Some(Arc::from(error));
                state.ended = true;
                None
            }
        }
    }
}
