use bytes::Bytes;

/// Frames a handler wants written, in order.
///
/// The connection driver takes the queued frames after each batch of
/// callbacks and hands them to the writer in order.
#[derive(Debug, Default)]
pub struct Outbound {
    frames: Vec<Bytes>,
}

impl Outbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one frame payload for writing.
    pub fn push(&mut self, payload: Bytes) {
        self.frames.push(payload);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Take every queued frame, leaving the buffer empty but allocated.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Bytes> {
        self.frames.drain(..)
    }

    /// Move the queued frames out as one batch.
    pub fn take(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.frames)
    }
}

/// Per-connection response policy.
///
/// Both connection roles share the framing machinery in
/// [`run_connection`](crate::connection::run_connection) and differ only in
/// what they emit when the connection comes up and when a frame arrives.
/// Callbacks for one connection never run concurrently.
pub trait FrameHandler: Send {
    /// The connection is established and writable.
    fn on_active(&mut self, out: &mut Outbound);

    /// One complete inbound frame was decoded.
    fn on_frame(&mut self, frame: Bytes, out: &mut Outbound);

    /// The connection ended, for whatever reason. No further callbacks follow.
    fn on_closed(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_drains_in_push_order() {
        let mut out = Outbound::new();
        out.push(Bytes::from_static(b"a"));
        out.push(Bytes::from_static(b"b"));
        assert_eq!(out.len(), 2);

        let drained: Vec<Bytes> = out.drain().collect();
        assert_eq!(drained, vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]);
        assert!(out.is_empty());
    }

    #[test]
    fn take_moves_the_whole_batch() {
        let mut out = Outbound::new();
        out.push(Bytes::from_static(b"x"));
        out.push(Bytes::from_static(b"y"));

        assert_eq!(out.take().len(), 2);
        assert!(out.is_empty());
        assert!(out.take().is_empty());
    }
}
