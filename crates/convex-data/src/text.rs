//! String cells: short UTF-8 runs and chunked trees for long text.

use crate::cell::Cell;
use crate::error::AccessError;
use crate::format::CHUNK_LENGTH;
use crate::value::{Value, ValueRef};

/// A string cell.
///
/// Strings of up to [`CHUNK_LENGTH`] UTF-8 bytes encode as a single short
/// string. Longer text is a tree whose children are maximal whole-character
/// chunks, so every child is independently valid UTF-8.
#[derive(Clone, Debug)]
pub enum Text {
    Short(String),
    Tree(TextTree),
}

/// Interior node of a chunked string.
#[derive(Clone, Debug)]
pub struct TextTree {
    byte_count: u64,
    children: Vec<ValueRef>,
}

impl Text {
    /// Build a string cell, chunking into a tree when above
    /// [`CHUNK_LENGTH`] bytes.
    pub fn from_str(s: &str) -> Text {
        if s.len() <= CHUNK_LENGTH {
            return Text::Short(s.to_string());
        }

        // Maximal whole-character chunks of at most CHUNK_LENGTH bytes.
        let mut parts: Vec<(u64, Value)> = Vec::new();
        let mut rest = s;
        while !rest.is_empty() {
            let split = Self::split_point(rest);
            let (chunk, tail) = rest.split_at(split);
            parts.push((
                chunk.len() as u64,
                Value::new(Cell::String(Text::Short(chunk.to_string()))),
            ));
            rest = tail;
        }

        // Group into trees of at most 16 children per level. A remainder
        // group of one stays a bare chunk so no tree node has fewer than
        // two children.
        while parts.len() > 16 {
            parts = parts
                .chunks(16)
                .map(|group| {
                    if group.len() == 1 {
                        return group[0].clone();
                    }
                    let byte_count: u64 = group.iter().map(|(n, _)| n).sum();
                    let children = group
                        .iter()
                        .map(|(_, value)| ValueRef::of(value.clone()))
                        .collect();
                    let tree = TextTree {
                        byte_count,
                        children,
                    };
                    (byte_count, Value::new(Cell::String(Text::Tree(tree))))
                })
                .collect();
        }

        let byte_count: u64 = parts.iter().map(|(n, _)| n).sum();
        let children = parts
            .into_iter()
            .map(|(_, value)| ValueRef::of(value))
            .collect();
        Text::Tree(TextTree {
            byte_count,
            children,
        })
    }

    fn split_point(s: &str) -> usize {
        if s.len() <= CHUNK_LENGTH {
            return s.len();
        }
        let mut i = CHUNK_LENGTH;
        while !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }

    /// Total byte count of the string.
    pub fn byte_count(&self) -> u64 {
        match self {
            Text::Short(s) => s.len() as u64,
            Text::Tree(tree) => tree.byte_count,
        }
    }

    /// Child refs, in order. Empty for short strings.
    pub fn child_refs(&self) -> Vec<&ValueRef> {
        match self {
            Text::Short(_) => Vec::new(),
            Text::Tree(tree) => tree.children.iter().collect(),
        }
    }

    /// Assemble the full string. Fails if any chunk is not resident.
    pub fn as_string(&self) -> Result<String, AccessError> {
        match self {
            Text::Short(s) => Ok(s.clone()),
            Text::Tree(tree) => {
                let mut out = String::with_capacity(tree.byte_count as usize);
                for child in &tree.children {
                    let value = child.value()?;
                    let Cell::String(text) = value.cell() else {
                        return Err(AccessError::WrongKind);
                    };
                    out.push_str(&text.as_string()?);
                }
                Ok(out)
            }
        }
    }
}

impl TextTree {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_stay_flat() {
        assert!(matches!(Text::from_str(""), Text::Short(_)));
        assert!(matches!(Text::from_str("hello"), Text::Short(_)));
        let exactly_chunk = "a".repeat(CHUNK_LENGTH);
        assert!(matches!(Text::from_str(&exactly_chunk), Text::Short(_)));
    }

    #[test]
    fn long_strings_become_trees() {
        let s = "a".repeat(CHUNK_LENGTH + 1);
        let text = Text::from_str(&s);
        let Text::Tree(tree) = &text else {
            panic!("expected tree");
        };
        assert_eq!(tree.children().len(), 2);
        assert_eq!(text.byte_count(), (CHUNK_LENGTH + 1) as u64);
    }

    #[test]
    fn chunks_respect_char_boundaries() {
        // 'é' is two bytes; an odd chunk length forces a boundary adjustment
        let s = "é".repeat(CHUNK_LENGTH); // 2 * CHUNK_LENGTH bytes
        let text = Text::from_str(&s);
        assert_eq!(text.as_string().unwrap(), s);
        for child in text.child_refs() {
            let value = child.value().unwrap();
            let Cell::String(Text::Short(chunk)) = value.cell() else {
                panic!("expected short string chunks");
            };
            assert!(chunk.len() <= CHUNK_LENGTH);
        }
    }

    #[test]
    fn roundtrip_assembly() {
        for n in [0, 10, CHUNK_LENGTH, CHUNK_LENGTH + 1, 3 * CHUNK_LENGTH + 17] {
            let s: String = ('a'..='z').cycle().take(n).collect();
            assert_eq!(Text::from_str(&s).as_string().unwrap(), s);
        }
    }

    #[test]
    fn very_long_strings_nest() {
        let s = "x".repeat(17 * CHUNK_LENGTH);
        let text = Text::from_str(&s);
        let Text::Tree(tree) = &text else {
            panic!("expected tree");
        };
        assert!(tree.children().len() <= 16);
        assert_eq!(text.as_string().unwrap().len(), s.len());
    }
}
