mod local;

pub use self::local::{local, ClientMessage, LocalServer, LocalTransport, Responder};
use crate::{Event, Reply, Request, Result, StreamIndex};

/// Connection to an audio server, as seen by the client.
///
/// `request` blocks until the server replies. `send` writes stream data
/// without waiting for anything. `recv_event` blocks until the server pushes
/// a notification and returns [`Error::Disconnected`](crate::Error) once the
/// connection is gone.
pub trait Transport: Send + Sync + 'static {
    fn request(&self, request: Request) -> Result<Reply>;

    fn send(&self, stream_index: StreamIndex, data: &[u8]) -> Result<()>;

    fn recv_event(&self) -> Result<Event>;
}
