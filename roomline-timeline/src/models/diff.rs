use std::fmt;

use serde::{Deserialize, Serialize};

use super::raw::RawItem;

/// One atomic change to the remote, ordered timeline.
///
/// Indices refer to the sequence as it stood immediately before the
/// operation.
///
/// ```
/// use timeline::models::{DiffKind, DiffOperation};
///
/// let op: DiffOperation = serde_json::from_str(r#"{ "op": "remove", "index": 3 }"#).unwrap();
/// assert_eq!(op, DiffOperation::Remove { index: 3 });
/// assert_eq!(op.kind(), DiffKind::Remove);
/// assert_eq!(op.index(), Some(3));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DiffOperation {
    /// Prepends one item.
    PushFront { item: RawItem },
    /// Appends one item.
    PushBack { item: RawItem },
    /// Inserts before `index`; `index == len` appends.
    Insert { index: usize, item: RawItem },
    /// Appends several items in order.
    Append { items: Vec<RawItem> },
    /// Replaces the item at `index`.
    Set { index: usize, item: RawItem },
    /// Removes the first item.
    PopFront,
    /// Removes the last item.
    PopBack,
    /// Removes the item at `index`.
    Remove { index: usize },
    /// Empties the sequence.
    Clear,
    /// Replaces the whole sequence.
    Reset { items: Vec<RawItem> },
}

/// Fieldless mirror of [`DiffOperation`] used in logs and errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    PushFront,
    PushBack,
    Insert,
    Append,
    Set,
    PopFront,
    PopBack,
    Remove,
    Clear,
    Reset,
}

impl DiffKind {
    /// Wire name, as used in the `op` tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PushFront => "push_front",
            Self::PushBack => "push_back",
            Self::Insert => "insert",
            Self::Append => "append",
            Self::Set => "set",
            Self::PopFront => "pop_front",
            Self::PopBack => "pop_back",
            Self::Remove => "remove",
            Self::Clear => "clear",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DiffOperation {
    /// Variant of this operation without its payload.
    #[must_use]
    pub const fn kind(&self) -> DiffKind {
        match self {
            Self::PushFront { .. } => DiffKind::PushFront,
            Self::PushBack { .. } => DiffKind::PushBack,
            Self::Insert { .. } => DiffKind::Insert,
            Self::Append { .. } => DiffKind::Append,
            Self::Set { .. } => DiffKind::Set,
            Self::PopFront => DiffKind::PopFront,
            Self::PopBack => DiffKind::PopBack,
            Self::Remove { .. } => DiffKind::Remove,
            Self::Clear => DiffKind::Clear,
            Self::Reset { .. } => DiffKind::Reset,
        }
    }

    /// Explicit index carried by the operation, if any.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        match self {
            Self::Insert { index, .. } | Self::Set { index, .. } | Self::Remove { index } => {
                Some(*index)
            }
            _ => None,
        }
    }
}
