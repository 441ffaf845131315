use std::env;
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rpulse_client::proto::transport::{self, ClientMessage, LocalServer};
use rpulse_client::proto::{
    CreatePlaybackStreamReply, Event, Reply, Request, StreamIndex, UNDEFINED,
};
use rpulse_client::{Callback, Client, Outcome, PlaybackOption};
use tracing_subscriber::EnvFilter;

const TICK: Duration = Duration::from_millis(20);

/// Stands in for an audio server: accepts one playback stream and asks for
/// data at the rate it would be played.
fn serve(server: LocalServer) {
    let playing = Arc::new(AtomicBool::new(false));
    let stopped = Arc::new(AtomicBool::new(false));
    let mut bytes_per_tick = 0;
    let mut received = 0usize;
    let mut ticker: Option<thread::JoinHandle<()>> = None;

    while let Ok(message) = server.recv() {
        let (request, responder) = match message {
            ClientMessage::Data { data, .. } => {
                received += data.len();
                continue;
            }
            ClientMessage::Request { request, responder } => (request, responder),
        };

        let reply = match request {
            Request::CreatePlaybackStream(req) => {
                let spec = req.sample_spec;
                let bytes_per_second = spec.rate as usize * spec.frame_size();
                bytes_per_tick = (bytes_per_second * TICK.as_millis() as usize / 1000) as u32;

                let target = match req.buffer_target_length {
                    UNDEFINED => (bytes_per_second / 10) as u32,
                    len => len,
                };

                tracing::info!(?spec, target, "stream created");

                Reply::CreatePlaybackStream(Box::new(CreatePlaybackStreamReply {
                    stream_index: StreamIndex(0),
                    sink_input_index: 0,
                    missing: target,
                    buffer_max_length: 2 * target,
                    buffer_target_length: target,
                    buffer_prebuffer_length: target,
                    buffer_minimum_request: bytes_per_tick,
                    sample_spec: spec,
                    channel_map: req.channel_map.clone(),
                    sink_index: 0,
                    sink_name: "simulated".into(),
                    stream_latency: 0,
                }))
            }
            Request::CorkPlaybackStream {
                stream_index,
                corked,
            } => {
                playing.store(!corked, Ordering::Relaxed);

                if ticker.is_none() && !corked {
                    let server = server.clone();
                    let playing = playing.clone();
                    let stopped = stopped.clone();
                    let length = bytes_per_tick;

                    ticker = Some(thread::spawn(move || {
                        while !stopped.load(Ordering::Relaxed) {
                            thread::sleep(TICK);
                            if !playing.load(Ordering::Relaxed) {
                                continue;
                            }

                            let event = Event::Request {
                                stream_index,
                                length,
                            };
                            if server.send_event(event).is_err() {
                                break;
                            }
                        }
                    }));
                }

                Reply::Ack
            }
            Request::DeletePlaybackStream { .. } => {
                stopped.store(true, Ordering::Relaxed);
                responder.respond(Ok(Reply::Ack));
                break;
            }
            _ => Reply::Ack,
        };

        responder.respond(Ok(reply));
    }

    if let Some(ticker) = ticker {
        let _ = ticker.join();
    }

    tracing::info!(received, "server finished");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let seconds = env::var("RPULSE_EXAMPLE_SECONDS")
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .unwrap_or(2.0);

    let sample_rate = 48000;
    let freq = 440.0;

    let (client_transport, server_transport) = transport::local(None);

    let server = thread::Builder::new()
        .name("simulated-server".into())
        .spawn(move || serve(server_transport))?;

    let client = Client::new(client_transport);

    let events = thread::Builder::new().name("events".into()).spawn({
        let client = client.clone();
        move || client.handle()
    })?;

    let total_frames = (seconds * sample_rate as f32) as u64;
    let mut frame = 0u64;

    let callback = Callback::fallible(move |samples: &mut [f32]| {
        if frame >= total_frames {
            return Outcome::EndOfData;
        }

        for pair in samples.chunks_exact_mut(2) {
            let t = frame as f32 / sample_rate as f32;
            let y = (t * freq * TAU).sin() * 0.25;
            pair[0] = y;
            pair[1] = y;
            frame += 1;
        }

        Outcome::Continue
    });

    let mut stream = client.new_playback(
        callback,
        [
            PlaybackOption::Stereo,
            PlaybackOption::SampleRate(sample_rate),
            PlaybackOption::Latency(0.05),
            PlaybackOption::media_name("rpulse tone"),
            PlaybackOption::media_icon_name("audio-x-generic"),
        ],
    )?;

    tracing::info!(
        rate = stream.sample_rate(),
        channels = stream.channels(),
        buffer_size = stream.buffer_size(),
        "playing for {seconds}s",
    );

    stream.start()?;

    while !stream.ended() {
        thread::sleep(Duration::from_millis(10));
    }

    stream.drain()?;

    if stream.underflow() {
        tracing::warn!("stream underflowed");
    }

    if let Some(error) = stream.error() {
        tracing::error!(%error, "callback failed");
    }

    stream.close()?;

    server.join().map_err(|_| "server thread panicked")?;
    events.join().map_err(|_| "event thread panicked")??;

    Ok(())
}
