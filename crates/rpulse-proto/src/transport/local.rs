use async_channel::{Receiver, Sender};

use super::Transport;
use crate::{Error, Event, Reply, Request, Result, StreamIndex};

pub fn local(cap: Option<usize>) -> (LocalTransport, LocalServer) {
    let ((client_sender, server_receiver), (event_sender, event_receiver)) = if let Some(cap) = cap
    {
        (async_channel::bounded(cap), async_channel::bounded(cap))
    } else {
        (async_channel::unbounded(), async_channel::unbounded())
    };

    (
        LocalTransport {
            sender: client_sender,
            events: event_receiver,
        },
        LocalServer {
            receiver: server_receiver,
            events: event_sender,
        },
    )
}

/// Everything a client can put on the wire.
#[derive(Debug)]
pub enum ClientMessage {
    Request {
        request: Request,
        responder: Responder,
    },
    Data {
        stream_index: StreamIndex,
        data: Vec<u8>,
    },
}

pub struct Responder {
    sender: oneshot::Sender<Result<Reply>>,
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder").finish_non_exhaustive()
    }
}

impl Responder {
    pub fn respond(self, reply: Result<Reply>) {
        let _ = self.sender.send(reply);
    }
}

#[derive(Debug, Clone)]
pub struct LocalTransport {
    sender: Sender<ClientMessage>,
    events: Receiver<Event>,
}

impl Transport for LocalTransport {
    fn request(&self, request: Request) -> Result<Reply> {
        let (sender, receiver) = oneshot::channel();
        let responder = Responder { sender };

        self.sender
            .send_blocking(ClientMessage::Request { request, responder })
            .map_err(|_| Error::Disconnected)?;

        receiver.recv().map_err(|_| Error::Disconnected)?
    }

    fn send(&self, stream_index: StreamIndex, data: &[u8]) -> Result<()> {
        self.sender
            .send_blocking(ClientMessage::Data {
                stream_index,
                data: data.to_vec(),
            })
            .map_err(|_| Error::Disconnected)
    }

    fn recv_event(&self) -> Result<Event> {
        self.events.recv_blocking().map_err(|_| Error::Disconnected)
    }
}

#[derive(Debug, Clone)]
pub struct LocalServer {
    receiver: Receiver<ClientMessage>,
    events: Sender<Event>,
}

impl LocalServer {
    pub fn recv(&self) -> Result<ClientMessage> {
        self.receiver.recv_blocking().map_err(|_| Error::Disconnected)
    }

    pub fn try_recv(&self) -> Option<ClientMessage> {
        self.receiver.try_recv().ok()
    }

    pub fn send_event(&self, event: Event) -> Result<()> {
        self.events
            .send_blocking(event)
            .map_err(|_| Error::Disconnected)
    }
}
