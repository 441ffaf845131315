use std::time::Duration;

/// An output device as reported by the server.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Sink {
    index: u32,
    name: String,
    requested_latency: Duration,
}

impl Sink {
    pub fn new(index: u32, name: impl Into<String>, requested_latency: Duration) -> Sink {
        Sink {
            index,
            name: name.into(),
            requested_latency,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowest latency the server considers safe for this sink.
    pub fn requested_latency(&self) -> Duration {
        self.requested_latency
    }
}
