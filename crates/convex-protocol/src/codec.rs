//! Frame encoding and decoding.

use bytes::Bytes;
use convex_data::format;
use convex_data::vlq::write_vlq_count;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::MessageType;

/// One decoded wire frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub message_type: MessageType,
    pub payload: Bytes,
}

/// Codec for the `[VLQ-Count length][type code][payload]` frame layout.
///
/// The declared length covers the type code and payload, not the length
/// prefix itself.
pub struct FrameCodec;

impl FrameCodec {
    /// Encode a frame.
    pub fn encode(message_type: MessageType, payload: &[u8]) -> ProtocolResult<Bytes> {
        let total = 1 + payload.len() as u64;
        if total > format::MAX_MESSAGE_LENGTH {
            return Err(ProtocolError::FrameTooLarge(total));
        }
        let mut out = Vec::with_capacity(payload.len() + 11);
        write_vlq_count(&mut out, total);
        out.push(message_type.code());
        out.extend_from_slice(payload);
        Ok(Bytes::from(out))
    }

    /// Decode one frame from the start of a buffer.
    ///
    /// Returns `Ok(None)` while the buffer does not yet hold a whole frame;
    /// on success, the frame and the total bytes consumed.
    pub fn decode(data: &[u8]) -> ProtocolResult<Option<(Frame, usize)>> {
        let Some((length, prefix)) = format::peek_message_length(data)? else {
            return Ok(None);
        };
        if length == 0 {
            return Err(ProtocolError::EmptyFrame);
        }
        let total = prefix + length as usize;
        if data.len() < total {
            return Ok(None);
        }
        let code = data[prefix];
        let message_type =
            MessageType::decode(code).ok_or(ProtocolError::UnknownMessageType(code))?;
        let payload = Bytes::copy_from_slice(&data[prefix + 1..total]);
        Ok(Some((
            Frame {
                message_type,
                payload,
            },
            total,
        )))
    }
}
