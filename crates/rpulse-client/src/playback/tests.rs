use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rpulse_proto::{
    CreatePlaybackStream, CreatePlaybackStreamReply, ErrorCode, Event, Reply, Request,
    Result as ProtoResult, SampleFormat, StreamIndex, Transport, UNDEFINED,
};

use super::*;

const INDEX: StreamIndex = StreamIndex(7);
const DEFAULT_TARGET_LENGTH: u32 = 4096;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create(Box<CreatePlaybackStream>),
    Cork(bool),
    Flush,
    Drain,
    Delete,
    Send(usize),
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
    failing: Arc<Mutex<Option<&'static str>>>,
}

impl Recorder {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn fail(&self, request: &'static str) {
        *self.failing.lock().unwrap() = Some(request);
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Transport for Recorder {
    fn request(&self, request: Request) -> ProtoResult<Reply> {
        if *self.failing.lock().unwrap() == Some(request.name()) {
            return Err(rpulse_proto::Error::Server(ErrorCode::Invalid));
        }

        match request {
            Request::CreatePlaybackStream(req) => {
                let reply = CreatePlaybackStreamReply {
                    stream_index: INDEX,
                    sink_input_index: 1,
                    missing: 0,
                    buffer_max_length: or_default(
                        req.buffer_max_length,
                        2 * DEFAULT_TARGET_LENGTH,
                    ),
                    buffer_target_length: or_default(
                        req.buffer_target_length,
                        DEFAULT_TARGET_LENGTH,
                    ),
                    buffer_prebuffer_length: 0,
                    buffer_minimum_request: 0,
                    sample_spec: req.sample_spec,
                    channel_map: req.channel_map.clone(),
                    sink_index: or_default(req.sink_index, 0),
                    sink_name: "default".into(),
                    stream_latency: 0,
                };
                self.push(Call::Create(req));
                Ok(Reply::CreatePlaybackStream(Box::new(reply)))
            }
            Request::CorkPlaybackStream { corked, .. } => {
                self.push(Call::Cork(corked));
                Ok(Reply::Ack)
            }
            Request::FlushPlaybackStream { .. } => {
                self.push(Call::Flush);
                Ok(Reply::Ack)
            }
            Request::DrainPlaybackStream { .. } => {
                self.push(Call::Drain);
                Ok(Reply::Ack)
            }
            Request::DeletePlaybackStream { .. } => {
                self.push(Call::Delete);
                Ok(Reply::Ack)
            }
        }
    }

    fn send(&self, stream_index: StreamIndex, data: &[u8]) -> ProtoResult<()> {
        assert_eq!(stream_index, INDEX);
        self.push(Call::Send(data.len()));
        Ok(())
    }

    fn recv_event(&self) -> ProtoResult<Event> {
        Err(rpulse_proto::Error::Disconnected)
    }
}

fn or_default(value: u32, default: u32) -> u32 {
    if value == UNDEFINED {
        default
    } else {
        value
    }
}

fn silence() -> Callback {
    Callback::new(|buf: &mut [i16]| buf.fill(0))
}

fn setup(
    callback: Callback,
    options: Vec<PlaybackOption>,
) -> Result<(Recorder, Client<Recorder>, PlaybackStream<Recorder>)> {
    let recorder = Recorder::default();
    let client = Client::new(recorder.clone());
    let stream = client.new_playback(callback, options)?;
    recorder.clear();
    Ok((recorder, client, stream))
}

#[test]
fn create_sends_configuration() -> Result<()> {
    let recorder = Recorder::default();
    let client = Client::new(recorder.clone());
    let stream = client.new_playback(
        silence(),
        vec![
            PlaybackOption::Stereo,
            PlaybackOption::SampleRate(44100),
            PlaybackOption::Latency(0.1),
            PlaybackOption::media_name("test"),
        ],
    )?;

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    let Call::Create(req) = &calls[0] else {
        panic!("expected a create request, got {calls:?}");
    };
    assert_eq!(req.sample_spec.format, SampleFormat::S16NE);
    assert_eq!(req.sample_spec.channels, 2);
    assert!(req.corked);
    assert_eq!(req.buffer_target_length, 17640);
    assert_eq!(req.channel_volumes.as_deref().map(<[u32]>::len), Some(2));

    assert_eq!(stream.stream_index(), INDEX);
    assert_eq!(stream.sample_rate(), 44100);
    assert_eq!(stream.channels(), 2);
    assert_eq!(stream.format(), SampleFormat::S16NE);
    assert_eq!(stream.bytes_per_sample(), 2);
    assert_eq!(stream.buffer_size_bytes(), 17640);
    assert_eq!(stream.buffer_size(), 4410);
    assert_eq!(stream.buffer_max_length(), 35280);

    assert!(!stream.running());
    assert!(stream.ended());
    assert!(!stream.underflow());
    assert!(!stream.closed());
    assert!(stream.error().is_none());
    assert_eq!(client.num_playback_streams(), 1);

    Ok(())
}

#[test]
fn negotiated_length_comes_from_reply() -> Result<()> {
    let (_, _, stream) = setup(silence(), vec![])?;

    assert_eq!(stream.buffer_size_bytes(), DEFAULT_TARGET_LENGTH as usize);
    assert_eq!(stream.buffer_size(), DEFAULT_TARGET_LENGTH as usize / 2);

    Ok(())
}

#[test]
fn configuration_errors_precede_requests() {
    let recorder = Recorder::default();
    let client = Client::new(recorder.clone());

    let res = Callback::raw(SampleFormat::Ulaw, |_| Outcome::Continue)
        .and_then(|callback| client.new_playback(callback, vec![]));
    assert!(matches!(res, Err(Error::UnsupportedFormat(SampleFormat::Ulaw))));

    let res = client.new_playback(silence(), vec![PlaybackOption::channels([])]);
    assert!(matches!(res, Err(Error::EmptyChannelMap)));

    assert!(recorder.calls().is_empty());
    assert_eq!(client.num_playback_streams(), 0);
}

#[test]
fn start_flushes_before_sending() -> Result<()> {
    let (recorder, _, mut stream) = setup(silence(), vec![])?;

    stream.start()?;

    assert_eq!(
        recorder.calls(),
        vec![
            Call::Flush,
            Call::Send(DEFAULT_TARGET_LENGTH as usize),
            Call::Cork(false),
        ]
    );
    assert!(stream.running());
    assert!(!stream.ended());
    assert!(!stream.underflow());

    Ok(())
}

#[test]
fn start_without_data_never_uncorks() -> Result<()> {
    let (recorder, _, mut stream) =
        setup(Callback::fallible(|_: &mut [u8]| Outcome::EndOfData), vec![])?;

    stream.start()?;

    assert_eq!(recorder.calls(), vec![Call::Flush]);
    assert!(!stream.running());
    assert!(stream.ended());
    assert!(stream.error().is_none());

    Ok(())
}

#[test]
fn callback_failure_is_recorded() -> Result<()> {
    let (recorder, _, mut stream) = setup(
        Callback::fallible(|_: &mut [f32]| Outcome::failed("out of samples")),
        vec![],
    )?;

    stream.start()?;

    assert_eq!(recorder.calls(), vec![Call::Flush]);
    assert!(stream.ended());
    assert_eq!(
        stream.error().map(|e| e.to_string()).as_deref(),
        Some("out of samples")
    );

    Ok(())
}

#[test]
fn stop_makes_no_requests() -> Result<()> {
    let (recorder, _, mut stream) = setup(silence(), vec![])?;
    stream.start()?;
    recorder.clear();

    stream.stop();

    assert!(recorder.calls().is_empty());
    assert!(stream.ended());
    assert!(stream.running());

    Ok(())
}

#[test]
fn pause_and_resume() -> Result<()> {
    let (recorder, _, mut stream) = setup(silence(), vec![])?;
    stream.start()?;
    recorder.clear();

    stream.pause()?;
    assert_eq!(recorder.calls(), vec![Call::Cork(true)]);
    assert!(!stream.running());

    stream.resume()?;
    assert_eq!(recorder.calls(), vec![Call::Cork(true), Call::Cork(false)]);
    assert!(stream.running());

    Ok(())
}

#[test]
fn resume_after_stop_is_noop() -> Result<()> {
    let (recorder, _, mut stream) = setup(silence(), vec![])?;
    stream.start()?;
    stream.pause()?;
    stream.stop();
    recorder.clear();

    stream.resume()?;

    assert!(recorder.calls().is_empty());
    assert!(!stream.running());

    Ok(())
}

#[test]
fn underflow_is_sticky_until_resume() -> Result<()> {
    let (_, client, mut stream) = setup(silence(), vec![])?;
    stream.start()?;

    client.handle_event(Event::Underflow {
        stream_index: INDEX,
    });
    assert!(stream.underflow());

    stream.pause()?;
    assert!(stream.underflow());

    stream.resume()?;
    assert!(!stream.underflow());

    client.handle_event(Event::Underflow {
        stream_index: INDEX,
    });
    assert!(stream.underflow());

    stream.start()?;
    assert!(!stream.underflow());

    Ok(())
}

#[test]
fn data_requests_feed_until_stopped() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let callback = Callback::new(move |buf: &mut [i16]| {
        counter.fetch_add(1, Ordering::Relaxed);
        buf.fill(0);
    });

    let (recorder, client, mut stream) = setup(callback, vec![])?;

    client.handle_event(Event::Request {
        stream_index: INDEX,
        length: 100,
    });
    assert!(recorder.calls().is_empty());
    assert_eq!(calls.load(Ordering::Relaxed), 0);

    stream.start()?;
    recorder.clear();

    client.handle_event(Event::Request {
        stream_index: INDEX,
        length: 100,
    });
    assert_eq!(recorder.calls(), vec![Call::Send(100)]);

    stream.stop();
    client.handle_event(Event::Request {
        stream_index: INDEX,
        length: 100,
    });
    assert_eq!(recorder.calls(), vec![Call::Send(100)]);
    assert_eq!(calls.load(Ordering::Relaxed), 2);

    Ok(())
}

#[test]
fn events_for_unknown_streams_are_ignored() -> Result<()> {
    let (recorder, client, mut stream) = setup(silence(), vec![])?;
    stream.start()?;
    recorder.clear();

    client.handle_event(Event::Underflow {
        stream_index: StreamIndex(99),
    });
    client.handle_event(Event::Request {
        stream_index: StreamIndex(99),
        length: 64,
    });

    assert!(!stream.underflow());
    assert!(recorder.calls().is_empty());

    Ok(())
}

#[test]
fn drain_only_when_running() -> Result<()> {
    let (recorder, _, mut stream) = setup(silence(), vec![])?;

    stream.drain()?;
    assert!(recorder.calls().is_empty());

    stream.start()?;
    stream.pause()?;
    recorder.clear();

    stream.drain()?;
    assert!(recorder.calls().is_empty());

    stream.resume()?;
    recorder.clear();

    stream.drain()?;
    assert_eq!(recorder.calls(), vec![Call::Drain]);

    Ok(())
}

#[test]
fn close_is_terminal() -> Result<()> {
    let (recorder, client, mut stream) = setup(silence(), vec![PlaybackOption::Stereo])?;
    stream.start()?;
    recorder.clear();

    stream.close()?;

    assert_eq!(recorder.calls(), vec![Call::Delete]);
    assert!(stream.closed());
    assert!(!stream.running());
    assert_eq!(client.num_playback_streams(), 0);

    assert!(matches!(stream.start(), Err(Error::Closed)));
    assert!(matches!(stream.pause(), Err(Error::Closed)));
    assert!(matches!(stream.resume(), Err(Error::Closed)));
    assert!(matches!(stream.drain(), Err(Error::Closed)));
    stream.close()?;
    stream.stop();

    assert_eq!(recorder.calls(), vec![Call::Delete]);
    assert_eq!(stream.channels(), 2);

    Ok(())
}

#[test]
fn killed_stream_is_closed() -> Result<()> {
    let (recorder, client, mut stream) = setup(silence(), vec![])?;
    stream.start()?;
    recorder.clear();

    client.handle_event(Event::PlaybackStreamKilled {
        stream_index: INDEX,
    });

    assert!(stream.closed());
    assert!(stream.ended());
    assert!(!stream.running());
    assert_eq!(client.num_playback_streams(), 0);
    assert!(matches!(stream.pause(), Err(Error::Closed)));

    stream.close()?;
    assert!(recorder.calls().is_empty());

    Ok(())
}

#[test]
fn closing_killed_stream_keeps_reused_index() -> Result<()> {
    let (recorder, client, mut old) = setup(silence(), vec![])?;

    client.handle_event(Event::PlaybackStreamKilled {
        stream_index: INDEX,
    });

    let mut new = client.new_playback(silence(), vec![])?;
    assert_eq!(new.stream_index(), old.stream_index());
    new.start()?;
    recorder.clear();

    old.close()?;
    drop(old);

    assert!(recorder.calls().is_empty());
    assert_eq!(client.num_playback_streams(), 1);

    client.handle_event(Event::Underflow {
        stream_index: INDEX,
    });
    assert!(new.underflow());

    client.handle_event(Event::Request {
        stream_index: INDEX,
        length: 64,
    });
    assert_eq!(recorder.calls(), vec![Call::Send(64)]);

    Ok(())
}

#[test]
fn request_failures_propagate() -> Result<()> {
    let (recorder, _, mut stream) = setup(silence(), vec![])?;
    stream.start()?;

    recorder.fail("CorkPlaybackStream");
    assert!(matches!(
        stream.pause(),
        Err(Error::Protocol(rpulse_proto::Error::Server(
            ErrorCode::Invalid
        )))
    ));
    assert!(stream.running());

    recorder.fail("DeletePlaybackStream");
    assert!(stream.close().is_err());
    assert!(stream.closed());

    Ok(())
}

#[test]
fn flush_failure_aborts_start() -> Result<()> {
    let (recorder, _, mut stream) = setup(silence(), vec![])?;
    recorder.fail("FlushPlaybackStream");

    assert!(stream.start().is_err());
    assert!(recorder.calls().is_empty());
    assert!(stream.ended());
    assert!(!stream.running());

    Ok(())
}

#[test]
fn drop_closes_stream() -> Result<()> {
    let (recorder, client, stream) = setup(silence(), vec![])?;

    drop(stream);

    assert_eq!(recorder.calls(), vec![Call::Delete]);
    assert_eq!(client.num_playback_streams(), 0);

    Ok(())
}

#[test]
fn raw_request_uses_stream_index() -> Result<()> {
    let (recorder, client, stream) = setup(silence(), vec![])?;

    let reply = client.raw_request(Request::FlushPlaybackStream {
        stream_index: stream.stream_index(),
    })?;

    assert_eq!(reply, Reply::Ack);
    assert_eq!(recorder.calls(), vec![Call::Flush]);

    Ok(())
}
