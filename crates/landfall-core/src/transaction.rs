//! Transaction boundaries around scheduler work.
//!
//! The engine stages every write of an activity tick or an event fan-out and
//! applies it only after [`TransactionScope::commit`] succeeds. A persistence
//! collaborator implements this trait to wrap its own begin/commit/rollback.

use crate::error::TransactionError;

pub trait TransactionScope {
    fn begin(&mut self);

    fn commit(&mut self) -> Result<(), TransactionError>;

    fn rollback(&mut self);
}

/// Scope for a purely in-memory world: every commit succeeds. Counts calls so
/// callers can assert on transaction structure.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InMemoryScope {
    pub begun: u32,
    pub committed: u32,
    pub rolled_back: u32,
    open: bool,
}

impl InMemoryScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl TransactionScope for InMemoryScope {
    fn begin(&mut self) {
        debug_assert!(!self.open, "nested transaction");
        self.open = true;
        self.begun += 1;
    }

    fn commit(&mut self) -> Result<(), TransactionError> {
        if !self.open {
            return Err(TransactionError("commit without begin".into()));
        }
        self.open = false;
        self.committed += 1;
        Ok(())
    }

    fn rollback(&mut self) {
        self.open = false;
        self.rolled_back += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_calls() {
        let mut scope = InMemoryScope::new();
        scope.begin();
        assert!(scope.is_open());
        scope.commit().unwrap();
        scope.begin();
        scope.rollback();
        assert_eq!((scope.begun, scope.committed, scope.rolled_back), (2, 1, 1));
        assert!(!scope.is_open());
    }

    #[test]
    fn test_commit_without_begin_fails() {
        let mut scope = InMemoryScope::new();
        assert!(scope.commit().is_err());
    }
}
