use crate::{ChannelMap, ChannelVolumes, Error, Result, SampleSpec, StreamIndex};

pub type Properties = ahash::HashMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct CreatePlaybackStream {
    pub sample_spec: SampleSpec,
    pub channel_map: ChannelMap,
    pub sink_index: u32,
    pub sink_name: Option<String>,
    pub buffer_max_length: u32,
    pub corked: bool,
    pub buffer_target_length: u32,
    pub buffer_prebuffer_length: u32,
    pub buffer_minimum_request: u32,
    /// `None` until a volume is chosen; the server rejects a missing volume.
    pub channel_volumes: Option<ChannelVolumes>,
    pub muted: bool,
    pub adjust_latency: bool,
    pub early_requests: bool,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatePlaybackStreamReply {
    pub stream_index: StreamIndex,
    pub sink_input_index: u32,
    /// Bytes the server wants right away.
    pub missing: u32,
    pub buffer_max_length: u32,
    pub buffer_target_length: u32,
    pub buffer_prebuffer_length: u32,
    pub buffer_minimum_request: u32,
    pub sample_spec: SampleSpec,
    pub channel_map: ChannelMap,
    pub sink_index: u32,
    pub sink_name: String,
    pub stream_latency: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    CreatePlaybackStream(Box<CreatePlaybackStream>),
    CorkPlaybackStream {
        stream_index: StreamIndex,
        corked: bool,
    },
    FlushPlaybackStream {
        stream_index: StreamIndex,
    },
    DrainPlaybackStream {
        stream_index: StreamIndex,
    },
    DeletePlaybackStream {
        stream_index: StreamIndex,
    },
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::CreatePlaybackStream(_) => "CreatePlaybackStream",
            Request::CorkPlaybackStream { .. } => "CorkPlaybackStream",
            Request::FlushPlaybackStream { .. } => "FlushPlaybackStream",
            Request::DrainPlaybackStream { .. } => "DrainPlaybackStream",
            Request::DeletePlaybackStream { .. } => "DeletePlaybackStream",
        }
    }

    pub fn stream_index(&self) -> Option<StreamIndex> {
        match *self {
            Request::CreatePlaybackStream(_) => None,
            Request::CorkPlaybackStream { stream_index, .. }
            | Request::FlushPlaybackStream { stream_index }
            | Request::DrainPlaybackStream { stream_index }
            | Request::DeletePlaybackStream { stream_index } => Some(stream_index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ack,
    CreatePlaybackStream(Box<CreatePlaybackStreamReply>),
}

impl Reply {
    pub fn into_ack(self, request: &'static str) -> Result<()> {
        match self {
            Reply::Ack => Ok(()),
            _ => Err(Error::UnexpectedReply { request }),
        }
    }

    pub fn into_create_playback_stream(self) -> Result<CreatePlaybackStreamReply> {
        match self {
            Reply::CreatePlaybackStream(reply) => Ok(*reply),
            _ => Err(Error::UnexpectedReply {
                request: "CreatePlaybackStream",
            }),
        }
    }
}

/// Notifications the server sends without being asked.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Event {
    /// The server wants `length` more bytes for the stream.
    Request {
        stream_index: StreamIndex,
        length: u32,
    },
    Underflow {
        stream_index: StreamIndex,
    },
    PlaybackStreamKilled {
        stream_index: StreamIndex,
    },
}

impl Event {
    pub fn stream_index(&self) -> StreamIndex {
        match *self {
            Event::Request { stream_index, .. }
            | Event::Underflow { stream_index }
            | Event::PlaybackStreamKilled { stream_index } => stream_index,
        }
    }
}
