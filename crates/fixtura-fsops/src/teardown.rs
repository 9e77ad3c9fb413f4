//! LIFO teardown stack for handles collected during a test.

use crate::error::FsOpsResult;
use crate::handle::UndoHandle;

/// Collects undo handles and releases them newest-first.
#[derive(Debug, Default)]
pub struct Teardown {
    handles: Vec<UndoHandle>,
}

impl Teardown {
    /// Empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a handle; it will be released before every handle pushed earlier.
    pub fn push(&mut self, handle: UndoHandle) {
        self.handles.push(handle);
    }

    /// Push the handle from an undoable call, passing its error through untouched.
    ///
    /// ```ignore
    /// teardown.defer(fsops.delete_undoable(&path))?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the error from `result`; nothing is pushed in that case.
    pub fn defer(&mut self, result: FsOpsResult<UndoHandle>) -> FsOpsResult<()> {
        self.push(result?);
        Ok(())
    }

    /// Number of pending handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no handles are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Release every pending handle in reverse push order, leaving the stack empty.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FsOpsError::Aggregate`] when any release failed; every
    /// handle is still attempted.
    pub fn release_all(&mut self) -> FsOpsResult<()> {
        if self.handles.is_empty() {
            return Ok(());
        }
        let newest_first: Vec<UndoHandle> = self.handles.drain(..).rev().collect();
        UndoHandle::combine(newest_first).release()
    }
}
