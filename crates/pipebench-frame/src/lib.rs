//! Length-prefixed framing for the pipebench wire protocol.
//!
//! Every frame on the wire is a 4-byte big-endian unsigned length followed by
//! exactly that many payload bytes:
//!
//! ```text
//! ┌──────────────────┬─────────────────────┐
//! │ Length (4B BE)   │ Payload             │
//! │ prefix excluded  │ (Length bytes)      │
//! └──────────────────┴─────────────────────┘
//! ```
//!
//! Decoders never emit a partial frame, and reject any declared length above
//! the configured ceiling before buffering the body.

pub mod codec;
pub mod error;
pub mod framed;
pub mod reader;

pub use codec::{
    decode_frame, encode_frame, peek_length, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use framed::FrameCodec;
pub use reader::FrameReader;
