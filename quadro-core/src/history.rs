/// Snapshot-based undo/redo stacks.
///
/// Snapshots are full clones; nothing is shared with the live value, so
/// later edits never reach back into history.
#[derive(Debug, Clone)]
pub struct History<T> {
    undo: Vec<T>,
    redo: Vec<T>,
    limit: Option<usize>,
}

impl<T: Clone> History<T> {
    /// `limit` caps the undo depth; the oldest snapshots are discarded first.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Push the pre-mutation state of a regular (non time-travel) commit.
    pub fn record(&mut self, snapshot: T) {
        self.undo.push(snapshot);
        self.redo.clear();
        if let Some(limit) = self.limit {
            let overflow = self.undo.len().saturating_sub(limit);
            self.undo.drain(..overflow);
        }
    }

    /// Step back: returns the state to restore and keeps `current` for redo.
    pub fn undo(&mut self, current: &T) -> Option<T> {
        let previous = self.undo.pop()?;
        self.redo.push(current.clone());
        Some(previous)
    }

    /// Step forward: returns the state to restore and keeps `current` for undo.
    pub fn redo(&mut self, current: &T) -> Option<T> {
        let next = self.redo.pop()?;
        self.undo.push(current.clone());
        Some(next)
    }

    pub fn reset(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}

impl<T: Clone> Default for History<T> {
    fn default() -> Self {
        Self::new(None)
    }
}
