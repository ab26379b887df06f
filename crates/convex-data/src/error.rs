use convex_types::Hash;
use thiserror::Error;

/// Errors for malformed or non-canonical encodings.
///
/// Every variant is a "bad format" condition: the bytes cannot have been
/// produced by the canonical encoder. Callers drop the frame or terminate the
/// peer; there is no recovery at this layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("unknown tag byte: 0x{0:02x}")]
    UnknownTag(u8),

    #[error("truncated encoding")]
    Truncated,

    #[error("empty encoding")]
    Empty,

    #[error("excess bytes after cell encoding: {remaining}")]
    TrailingBytes { remaining: usize },

    #[error("non-minimal VLQ encoding")]
    NonCanonicalVlq,

    #[error("VLQ overflows 64 bits")]
    VlqOverflow,

    #[error("cell encoding exceeds limit: {length} > {limit}")]
    OversizeEncoding { length: usize, limit: usize },

    #[error("message length exceeds frame limit: {0}")]
    OversizeMessage(u64),

    #[error("non-embeddable cell inlined as child")]
    IllegalEmbedded,

    #[error("embeddable cell transmitted as a separate ref")]
    RedundantRef,

    #[error("non-canonical encoding: {0}")]
    NonCanonical(&'static str),

    #[error("invalid UTF-8 in string payload")]
    InvalidUtf8,

    #[error("nesting depth exceeds limit")]
    DepthLimit,

    #[error("child length prefix disagrees with actual encoding length")]
    ChildLengthMismatch,
}

/// Result alias for encode/decode operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Raised when a partial ref is dereferenced.
///
/// Not a format error: the encoding is fine, the referenced cell simply is
/// not resident. Callers typically respond with a missing-data request for
/// the hash.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing data for hash {0}")]
pub struct MissingData(pub Hash);

/// Errors from traversing a cell graph through its refs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error(transparent)]
    Missing(#[from] MissingData),

    /// A resolved child had a kind its parent cannot contain (e.g. a long
    /// inside a blob tree). Only reachable with a malformed dictionary.
    #[error("unexpected child kind")]
    WrongKind,
}
