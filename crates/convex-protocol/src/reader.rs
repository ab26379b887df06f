//! Buffered accumulation of frames from a byte stream.

use tracing::trace;

use crate::codec::{Frame, FrameCodec};
use crate::error::ProtocolResult;

/// Reassembles frames from arbitrarily-fragmented stream input.
///
/// Feed received byte runs with [`feed`], then drain complete frames with
/// [`next`]. Partial frames stay buffered until the rest arrives; the
/// buffer grows as needed to hold one full frame.
///
/// [`feed`]: MessageReader::feed
/// [`next`]: MessageReader::next
pub struct MessageReader {
    buffer: Vec<u8>,
    received_count: u64,
}

impl MessageReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            received_count: 0,
        }
    }

    /// Append bytes received from the stream.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Extract the next complete frame, if one is buffered.
    ///
    /// A malformed prefix or unknown type code fails the whole stream;
    /// callers should drop the connection rather than resynchronize.
    pub fn next(&mut self) -> ProtocolResult<Option<Frame>> {
        match FrameCodec::decode(&self.buffer)? {
            None => Ok(None),
            Some((frame, consumed)) => {
                self.buffer.drain(..consumed);
                self.received_count += 1;
                trace!(message_type = %frame.message_type, "frame received");
                Ok(Some(frame))
            }
        }
    }

    /// Total frames extracted by this reader.
    pub fn received_count(&self) -> u64 {
        self.received_count
    }

    /// Bytes currently buffered.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for MessageReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::message::MessageType;

    #[test]
    fn whole_frame_in_one_feed() {
        let mut reader = MessageReader::new();
        reader.feed(&FrameCodec::encode(MessageType::Data, b"abc").unwrap());
        let frame = reader.next().unwrap().unwrap();
        assert_eq!(frame.message_type, MessageType::Data);
        assert_eq!(frame.payload.as_ref(), b"abc");
        assert_eq!(reader.next().unwrap(), None);
        assert_eq!(reader.buffered_len(), 0);
    }

    #[test]
    fn frame_split_across_feeds() {
        let encoded = FrameCodec::encode(MessageType::Belief, &[0x55; 500]).unwrap();
        let mut reader = MessageReader::new();
        for chunk in encoded.chunks(7) {
            reader.feed(chunk);
        }
        let frame = reader.next().unwrap().unwrap();
        assert_eq!(frame.payload.len(), 500);
    }

    #[test]
    fn partial_frame_stays_buffered() {
        let encoded = FrameCodec::encode(MessageType::Query, &[1; 100]).unwrap();
        let mut reader = MessageReader::new();
        reader.feed(&encoded[..50]);
        assert_eq!(reader.next().unwrap(), None);
        assert_eq!(reader.buffered_len(), 50);

        reader.feed(&encoded[50..]);
        assert!(reader.next().unwrap().is_some());
    }

    #[test]
    fn multiple_frames_drain_in_order() {
        let mut reader = MessageReader::new();
        reader.feed(&FrameCodec::encode(MessageType::Query, b"one").unwrap());
        reader.feed(&FrameCodec::encode(MessageType::Result, b"two").unwrap());

        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.message_type, MessageType::Query);
        let second = reader.next().unwrap().unwrap();
        assert_eq!(second.message_type, MessageType::Result);
        assert_eq!(reader.received_count(), 2);
    }

    #[test]
    fn unknown_type_fails_the_stream() {
        let mut reader = MessageReader::new();
        reader.feed(&[0x01, 0x63]);
        assert_eq!(
            reader.next(),
            Err(ProtocolError::UnknownMessageType(0x63))
        );
    }

    #[test]
    fn trailing_bytes_of_next_frame_are_kept() {
        let first = FrameCodec::encode(MessageType::Data, b"first").unwrap();
        let second = FrameCodec::encode(MessageType::Data, b"second").unwrap();
        let mut combined = first.to_vec();
        combined.extend_from_slice(&second[..3]);

        let mut reader = MessageReader::new();
        reader.feed(&combined);
        assert!(reader.next().unwrap().is_some());
        assert_eq!(reader.buffered_len(), 3);
        reader.feed(&second[3..]);
        let frame = reader.next().unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), b"second");
    }
}
