//! Per-call NDR context
//!
//! Conformant structures transmit the sizes of their conformant members once,
//! at the start of the outermost structure. The context carries those sizes
//! down to the nested member that owns the data, so that it is not written or
//! read a second time.

use std::sync::Arc;

/// Immutable context threaded through one marshal or unmarshal call tree
///
/// Cloning is cheap; installing size info returns a new context and leaves
/// the caller's untouched.
#[derive(Debug, Clone, Default)]
pub struct NdrContext {
    size_info: Option<Arc<[u64]>>,
}

impl NdrContext {
    /// Empty context, as seen by top-level fields and deferred referents
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes hoisted by an enclosing conformant aggregate, if any
    pub fn size_info(&self) -> Option<&[u64]> {
        self.size_info.as_deref()
    }

    /// Size of the given dimension, or 0 when no size info is installed
    pub fn dimension(&self, index: usize) -> u64 {
        self.size_info
            .as_deref()
            .and_then(|sizes| sizes.get(index).copied())
            .unwrap_or(0)
    }

    /// Context carrying the given sizes for the remainder of the aggregate
    pub fn with_size_info(&self, sizes: impl Into<Arc<[u64]>>) -> Self {
        Self {
            size_info: Some(sizes.into()),
        }
    }

    /// Context with the size info removed, for fields that must not see it
    pub fn without_size_info(&self) -> Self {
        Self { size_info: None }
    }
}
