use std::error::Error as StdError;
use std::fmt;
use std::mem::size_of;
use std::sync::Arc;

use rpulse_proto::SampleFormat;

use crate::{Error, Result};

pub type CallbackError = Box<dyn StdError + Send + Sync + 'static>;

/// A callback failure as recorded on the stream.
pub type StreamError = Arc<dyn StdError + Send + Sync + 'static>;

/// What a callback wants the stream to do after filling a buffer.
#[derive(Debug)]
pub enum Outcome {
    Continue,
    /// Stop feeding the stream without recording an error.
    EndOfData,
    Failed(CallbackError),
}

impl Outcome {
    pub fn failed<E: Into<CallbackError>>(error: E) -> Outcome {
        Outcome::Failed(error.into())
    }
}

impl<E: Into<CallbackError>> From<std::result::Result<(), E>> for Outcome {
    fn from(result: std::result::Result<(), E>) -> Self {
        match result {
            Ok(()) => Outcome::Continue,
            Err(error) => Outcome::Failed(error.into()),
        }
    }
}

/// Element types a callback may be written against.
pub trait Sample: bytemuck::Pod + Send + 'static {
    const FORMAT: SampleFormat;
}

impl Sample for u8 {
    const FORMAT: SampleFormat = SampleFormat::U8;
}

impl Sample for i16 {
    const FORMAT: SampleFormat = SampleFormat::S16NE;
}

impl Sample for i32 {
    const FORMAT: SampleFormat = SampleFormat::S32NE;
}

impl Sample for f32 {
    const FORMAT: SampleFormat = SampleFormat::F32NE;
}

type ByteCallback = Box<dyn FnMut(&mut [u8]) -> Outcome + Send + 'static>;

/// A user callback normalized to operate on raw bytes.
///
/// Typed callbacks see the same memory the transmitter sends, reinterpreted
/// in native byte order.
pub struct Callback {
    func: ByteCallback,
    format: SampleFormat,
}

impl Callback {
    /// Wraps a callback that never ends the stream on its own.
    pub fn new<S, F>(mut func: F) -> Callback
    where
        S: Sample,
        F: FnMut(&mut [S]) + Send + 'static,
    {
        Callback {
            func: Box::new(move |buf| {
                func(as_samples(buf));
                Outcome::Continue
            }),
            format: S::FORMAT,
        }
    }

    /// Wraps a callback that may end the stream, gracefully or with an error.
    pub fn fallible<S, F>(mut func: F) -> Callback
    where
        S: Sample,
        F: FnMut(&mut [S]) -> Outcome + Send + 'static,
    {
        Callback {
            func: Box::new(move |buf| func(as_samples(buf))),
            format: S::FORMAT,
        }
    }

    /// Wraps a byte callback producing samples in `format`.
    ///
    /// Only the formats a typed callback could produce are accepted.
    pub fn raw<F>(format: SampleFormat, func: F) -> Result<Callback>
    where
        F: FnMut(&mut [u8]) -> Outcome + Send + 'static,
    {
        if !is_supported(format) {
            return Err(Error::UnsupportedFormat(format));
        }

        Ok(Callback {
            func: Box::new(func),
            format,
        })
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.format.sample_size()
    }

    pub(crate) fn call(&mut self, buf: &mut [u8]) -> Outcome {
        (self.func)(buf)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

fn is_supported(format: SampleFormat) -> bool {
    format == SampleFormat::U8
        || format == SampleFormat::S16NE
        || format == SampleFormat::S32NE
        || format == SampleFormat::F32NE
}

// A trailing partial sample stays untouched. The pump hands out buffers
// aligned for every supported sample type.
fn as_samples<S: Sample>(buf: &mut [u8]) -> &mut [S] {
    let len = buf.len() - buf.len() % size_of::<S>();
    bytemuck::cast_slice_mut(&mut buf[..len])
}
