//! Stream framing for the peer wire protocol.
//!
//! On a raw byte stream each message is
//! `[VLQ-Count total length][1-byte type code][payload]`. The payload of a
//! data-bearing message is a multi-cell cell encoding. This crate owns the
//! framing and the payload shapes; it does not own any transport.

pub mod codec;
pub mod error;
pub mod message;
pub mod reader;

pub use codec::{Frame, FrameCodec};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{data_request, data_response, MessageType};
pub use reader::MessageReader;
