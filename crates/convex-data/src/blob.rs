//! Byte blobs: flat chunks up to 4096 bytes, trees above that.

use bytes::{Bytes, BytesMut};

use crate::cell::Cell;
use crate::error::AccessError;
use crate::format::CHUNK_LENGTH;
use crate::value::{Value, ValueRef};

/// A binary blob cell.
///
/// Blobs of up to [`CHUNK_LENGTH`] bytes encode as a single leaf chunk.
/// Larger blobs are trees over full 4096-byte chunks so that every node's
/// own encoding stays small.
#[derive(Clone, Debug)]
pub enum Blob {
    Leaf(Bytes),
    Tree(BlobTree),
}

/// Interior node of a chunked blob.
#[derive(Clone, Debug)]
pub struct BlobTree {
    byte_count: u64,
    children: Vec<ValueRef>,
}

impl Blob {
    /// Build a blob, chunking into a tree when above [`CHUNK_LENGTH`].
    ///
    /// Leaf slices share the input buffer; no bytes are copied.
    pub fn from_bytes(data: Bytes) -> Blob {
        let n = data.len();
        if n <= CHUNK_LENGTH {
            return Blob::Leaf(data);
        }
        let chunk = Self::chunk_size(n);
        let mut children = Vec::with_capacity(n.div_ceil(chunk));
        let mut offset = 0;
        while offset < n {
            let end = usize::min(offset + chunk, n);
            let child = Blob::from_bytes(data.slice(offset..end));
            children.push(ValueRef::of(Value::new(Cell::Blob(child))));
            offset = end;
        }
        Blob::Tree(BlobTree {
            byte_count: n as u64,
            children,
        })
    }

    /// The child capacity used at the top level of a tree over `n` bytes:
    /// the smallest power-of-16 multiple of the chunk length that keeps the
    /// fanout within 16.
    pub(crate) fn chunk_size(n: usize) -> usize {
        let mut chunk = CHUNK_LENGTH;
        while n.div_ceil(chunk) > 16 {
            chunk *= 16;
        }
        chunk
    }

    /// Total byte count.
    pub fn byte_count(&self) -> u64 {
        match self {
            Blob::Leaf(data) => data.len() as u64,
            Blob::Tree(tree) => tree.byte_count,
        }
    }

    /// Child refs, in order. Empty for leaves.
    pub fn child_refs(&self) -> Vec<&ValueRef> {
        match self {
            Blob::Leaf(_) => Vec::new(),
            Blob::Tree(tree) => tree.children.iter().collect(),
        }
    }

    /// Assemble the full byte content. Fails if any chunk is not resident.
    pub fn to_bytes(&self) -> Result<Bytes, AccessError> {
        match self {
            Blob::Leaf(data) => Ok(data.clone()),
            Blob::Tree(tree) => {
                let mut out = BytesMut::with_capacity(tree.byte_count as usize);
                for child in &tree.children {
                    let value = child.value()?;
                    let Cell::Blob(blob) = value.cell() else {
                        return Err(AccessError::WrongKind);
                    };
                    out.extend_from_slice(&blob.to_bytes()?);
                }
                Ok(out.freeze())
            }
        }
    }
}

impl BlobTree {
    /// Reassemble a tree from decoded parts. Callers validate the shape.
    pub(crate) fn from_parts(byte_count: u64, children: Vec<ValueRef>) -> Self {
        Self {
            byte_count,
            children,
        }
    }

    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }

    pub fn children(&self) -> &[ValueRef] {
        &self.children
    }
}
