use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: big-endian payload length (4) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Default maximum payload size: 128 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 128 * 1024 * 1024;

/// Encode one frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬─────────────────┐
/// │ Length (4B BE)   │ Payload          │
/// │                  │ (Length bytes)   │
/// └──────────────────┴─────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Read the declared payload length without consuming anything.
///
/// Returns `None` until the full header is buffered.
pub fn peek_length(src: &[u8]) -> Option<usize> {
    let header: [u8; HEADER_SIZE] = src.get(..HEADER_SIZE)?.try_into().ok()?;
    Some(u32::from_be_bytes(header) as usize)
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. An oversized length
/// is rejected as soon as the header is visible; nothing is consumed.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    let Some(payload_len) = peek_length(src) else {
        return Ok(None); // Need more data
    };

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 128 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_all(payloads: &[&[u8]]) -> BytesMut {
        let mut wire = BytesMut::new();
        for payload in payloads {
            encode_frame(payload, &mut wire).unwrap();
        }
        wire
    }

    /// Feed `wire` to the decoder in chunks of `chunk` bytes, collecting frames.
    fn decode_chunked(wire: &[u8], chunk: usize) -> Vec<Bytes> {
        let mut buf = BytesMut::new();
        let mut frames = Vec::new();
        for piece in wire.chunks(chunk) {
            buf.extend_from_slice(piece);
            while let Some(frame) = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap() {
                frames.push(frame);
            }
        }
        assert!(buf.is_empty(), "no trailing bytes expected");
        frames
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = [0u8; 32];

        encode_frame(&payload, &mut buf).unwrap();

        assert_eq!(buf.len(), HEADER_SIZE + payload.len());
        assert_eq!(&buf[..HEADER_SIZE], &[0, 0, 0, 32]);

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();

        assert_eq!(frame.as_ref(), &payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_length_is_big_endian() {
        let payload = vec![7u8; 0x0102];
        let mut buf = BytesMut::new();
        encode_frame(&payload, &mut buf).unwrap();
        assert_eq!(&buf[..HEADER_SIZE], &[0x00, 0x00, 0x01, 0x02]);
        assert_eq!(peek_length(&buf), Some(0x0102));
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x00, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 3, "partial header must stay buffered");
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2); // Truncate payload

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), HEADER_SIZE + 2);
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u32(200 * 1024 * 1024);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(
            result,
            Err(FrameError::PayloadTooLarge {
                size: 209_715_200,
                max: DEFAULT_MAX_PAYLOAD
            })
        ));
    }

    #[test]
    fn test_decode_at_exact_maximum() {
        let mut buf = BytesMut::new();
        encode_frame(&[1u8; 16], &mut buf).unwrap();
        let frame = decode_frame(&mut buf, 16).unwrap().unwrap();
        assert_eq!(frame.len(), 16);

        encode_frame(&[1u8; 17], &mut buf).unwrap();
        assert!(decode_frame(&mut buf, 16).is_err());
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = encode_all(&[b"first", b"second"]);

        let f1 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(f1.as_ref(), b"first");

        let f2 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(f2.as_ref(), b"second");

        assert!(buf.is_empty());
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &mut buf).unwrap();

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert!(frame.is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fragmentation_does_not_change_output() {
        let wire = encode_all(&[b"alpha", b"", &[0u8; 32], b"omega-frame"]);
        let whole = decode_chunked(&wire, wire.len());
        assert_eq!(whole.len(), 4);

        for chunk in 1..wire.len() {
            assert_eq!(decode_chunked(&wire, chunk), whole, "chunk size {chunk}");
        }
    }

    #[test]
    fn test_arbitrary_split_points() {
        let wire = encode_all(&[b"one", b"two", b"three"]);
        let expected = decode_chunked(&wire, wire.len());

        for split in 0..=wire.len() {
            let (head, tail) = wire.split_at(split);
            let mut buf = BytesMut::new();
            let mut frames = Vec::new();
            for piece in [head, tail] {
                buf.extend_from_slice(piece);
                while let Some(frame) = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap() {
                    frames.push(frame);
                }
            }
            assert_eq!(frames, expected, "split at {split}");
        }
    }
}
