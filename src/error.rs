//! Errors reported by insertion operations.

use std::{
    alloc::Layout,
    error,
    fmt::{self, Debug, Display, Formatter},
};

#[derive(Copy, Clone, PartialEq, Eq)]
enum ErrorKind {
    AllocFailed { layout: Layout },
}

/// An error type indicating that an insertion could not allocate its node.
///
/// When an insertion returns `Error`, the tree is exactly as it was before the call: no node was
/// linked and the size is unchanged.
///
/// Failure to construct a value is not reported through `Error`. Value constructors are closures
/// supplied by the caller, and a panic in one of them unwinds through the tree after the node slot
/// has been released.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    #[cold]
    pub(crate) fn alloc_failed(layout: Layout) -> Self {
        Error {
            kind: ErrorKind::AllocFailed { layout },
        }
    }

    /// The layout of the allocation that failed.
    #[inline]
    pub fn layout(&self) -> Layout {
        match self.kind {
            ErrorKind::AllocFailed { layout } => layout,
        }
    }
}

impl Debug for Error {
    #[cold]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::AllocFailed { layout } => formatter
                .debug_struct("Error")
                .field("kind", &"AllocFailed")
                .field("size", &layout.size())
                .field("align", &layout.align())
                .finish(),
        }
    }
}

impl Display for Error {
    #[cold]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::AllocFailed { layout } => write!(
                formatter,
                "failed to allocate a tree node ({} bytes, align {})",
                layout.size(),
                layout.align()
            ),
        }
    }
}

impl error::Error for Error {}
