use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::codec::{decode_frame, encode_frame, peek_length, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Async frame codec for use with `tokio_util::codec::{FramedRead, FramedWrite}`.
///
/// Decodes inbound bytes into payload [`Bytes`] and encodes outbound payloads
/// with their length prefix. The same ceiling applies in both directions.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_payload_size: usize,
}

impl FrameCodec {
    /// Create a codec with the default 128 MiB ceiling.
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    /// Create a codec from explicit configuration.
    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            max_payload_size: config.max_payload_size,
        }
    }

    /// Maximum accepted payload size in bytes.
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        match decode_frame(src, self.max_payload_size) {
            Ok(Some(frame)) => Ok(Some(frame)),
            Ok(None) => {
                // Header known: make room for the rest of this frame in one go.
                if let Some(len) = peek_length(src) {
                    src.reserve(HEADER_SIZE + len - src.len());
                }
                Ok(None)
            }
            Err(err) => {
                debug!(error = %err, "rejecting inbound frame");
                Err(err)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            None if buf.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        if item.len() > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.len(),
                max: self.max_payload_size,
            });
        }
        encode_frame(&item, dst)
    }
}
