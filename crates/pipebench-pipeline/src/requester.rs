use bytes::Bytes;
use tracing::debug;

use crate::counter::{CompletionReader, CompletionRecorder};
use crate::handler::{FrameHandler, Outbound};
use crate::payload::Payload;

/// Lifecycle of the client role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequesterState {
    /// Waiting for the connection to come up.
    Connecting,
    /// Burst sent; every completion is replaced one-for-one.
    Active,
    /// Connection gone. The counter keeps its last value.
    Terminated,
}

/// Client role: keeps a fixed number of requests in flight.
///
/// On activation it sends `depth` frames back-to-back. Each inbound frame is
/// counted as one completed round trip and immediately replaced by a new
/// request, so `outstanding()` stays at `depth` while the peer keeps echoing.
/// Responses are matched by count only (strict FIFO echo assumed).
#[derive(Debug)]
pub struct PipelinedRequester {
    payload: Payload,
    depth: usize,
    recorder: CompletionRecorder,
    state: RequesterState,
    sent: u64,
}

impl PipelinedRequester {
    pub fn new(payload: Payload, depth: usize, recorder: CompletionRecorder) -> Self {
        Self {
            payload,
            depth,
            recorder,
            state: RequesterState::Connecting,
            sent: 0,
        }
    }

    pub fn state(&self) -> RequesterState {
        self.state
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Requests written so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Round trips completed so far.
    pub fn completed(&self) -> u64 {
        self.recorder.get()
    }

    /// Requests sent but not yet answered.
    pub fn outstanding(&self) -> u64 {
        self.sent - self.recorder.get()
    }

    /// A reader for the completion counter this requester advances.
    pub fn completions(&self) -> CompletionReader {
        self.recorder.reader()
    }
}

impl FrameHandler for PipelinedRequester {
    fn on_active(&mut self, out: &mut Outbound) {
        if self.state != RequesterState::Connecting {
            return;
        }
        for _ in 0..self.depth {
            out.push(self.payload.duplicate());
        }
        self.sent += self.depth as u64;
        self.state = RequesterState::Active;
        debug!(depth = self.depth, "pipeline filled");
    }

    fn on_frame(&mut self, _frame: Bytes, out: &mut Outbound) {
        if self.state != RequesterState::Active {
            return;
        }
        self.recorder.increment();
        out.push(self.payload.duplicate());
        self.sent += 1;
    }

    fn on_closed(&mut self) {
        if self.state != RequesterState::Terminated {
            debug!(
                sent = self.sent,
                completed = self.recorder.get(),
                "requester terminated"
            );
        }
        self.state = RequesterState::Terminated;
    }
}
