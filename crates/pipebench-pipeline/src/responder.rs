use bytes::Bytes;

use crate::handler::{FrameHandler, Outbound};
use crate::payload::Payload;

/// Server role: answers every inbound frame with one frame of the shared payload.
///
/// Inbound content is never inspected; the frame is dropped as soon as the
/// reply is queued.
#[derive(Debug, Clone)]
pub struct EchoResponder {
    payload: Payload,
    echoed: u64,
}

impl EchoResponder {
    pub fn new(payload: Payload) -> Self {
        Self { payload, echoed: 0 }
    }

    /// Replies queued so far on this connection.
    pub fn echoed(&self) -> u64 {
        self.echoed
    }
}

impl FrameHandler for EchoResponder {
    fn on_active(&mut self, _out: &mut Outbound) {}

    fn on_frame(&mut self, _frame: Bytes, out: &mut Outbound) {
        out.push(self.payload.duplicate());
        self.echoed += 1;
    }
}
