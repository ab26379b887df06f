use thiserror::Error;

/// Errors from framing and message handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("format error: {0}")]
    Format(#[from] convex_data::FormatError),

    #[error("unknown message type code: {0}")]
    UnknownMessageType(u8),

    #[error("frame carries no type code")]
    EmptyFrame,

    #[error("frame too large: {0}")]
    FrameTooLarge(u64),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
