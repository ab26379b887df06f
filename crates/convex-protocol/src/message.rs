//! Message type codes and payload shapes.

use bytes::Bytes;
use convex_data::{Blob, Cell, Value};
use convex_types::Hash;

/// Wire message types. The registry is closed; unknown codes are rejected
/// at the framing layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// A belief delta broadcast (multi-cell payload).
    Belief = 1,
    /// Request for the peer's latest belief (empty payload).
    RequestBelief = 2,
    /// Cells sent in response to a data request.
    Data = 3,
    /// Request for cells by hash.
    RequestData = 4,
    /// A read-only query.
    Query = 5,
    /// A signed transaction submission.
    Transact = 6,
    /// A result for a previous query or transaction.
    Result = 7,
    /// Orderly connection shutdown.
    Goodbye = 8,
}

impl MessageType {
    /// The wire code for this type.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Resolve a wire code.
    pub fn decode(code: u8) -> Option<MessageType> {
        match code {
            1 => Some(MessageType::Belief),
            2 => Some(MessageType::RequestBelief),
            3 => Some(MessageType::Data),
            4 => Some(MessageType::RequestData),
            5 => Some(MessageType::Query),
            6 => Some(MessageType::Transact),
            7 => Some(MessageType::Result),
            8 => Some(MessageType::Goodbye),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageType::Belief => "belief",
            MessageType::RequestBelief => "request-belief",
            MessageType::Data => "data",
            MessageType::RequestData => "request-data",
            MessageType::Query => "query",
            MessageType::Transact => "transact",
            MessageType::Result => "result",
            MessageType::Goodbye => "goodbye",
        };
        write!(f, "{name}")
    }
}

/// Build a data-request payload: `[id, hash₁, hash₂, …]` as a vector cell.
/// Requested hashes travel as 32-byte blobs.
pub fn data_request(id: Value, hashes: &[Hash]) -> Value {
    let mut cells = Vec::with_capacity(hashes.len() + 1);
    cells.push(id);
    for hash in hashes {
        cells.push(Value::new(Cell::Blob(Blob::from_bytes(
            Bytes::copy_from_slice(hash.as_bytes()),
        ))));
    }
    Value::vector(cells)
}

/// Build a data-response payload: `[id, cell₁, cell₂, …]` as a vector cell.
pub fn data_response(id: Value, cells: &[Value]) -> Value {
    let mut payload = Vec::with_capacity(cells.len() + 1);
    payload.push(id);
    payload.extend(cells.iter().cloned());
    Value::vector(payload)
}
