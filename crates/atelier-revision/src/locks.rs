//! Per-deliverable revision locks
//!
//! In-process advisory locks enforcing at most one active revision per
//! deliverable. A concurrent attempt is rejected immediately rather than
//! queued; the caller retries once the active revision lands.

use atelier_core::{AtelierError, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct RevisionLocks {
    held: Arc<Mutex<HashSet<Uuid>>>,
}

/// Releases the lock on drop
#[derive(Debug)]
pub struct RevisionGuard {
    held: Arc<Mutex<HashSet<Uuid>>>,
    id: Uuid,
}

impl RevisionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a deliverable or fail fast
    pub fn acquire(&self, deliverable_id: Uuid) -> Result<RevisionGuard> {
        let mut held = self
            .held
            .lock()
            .map_err(|_| AtelierError::Internal("revision lock poisoned".to_string()))?;
        if !held.insert(deliverable_id) {
            return Err(AtelierError::ModificationFailed(format!(
                "deliverable {} already has a revision in flight",
                deliverable_id
            )));
        }
        Ok(RevisionGuard {
            held: self.held.clone(),
            id: deliverable_id,
        })
    }
}

impl Drop for RevisionGuard {
    fn drop(&mut self) {
        if let Ok(mut held) = self.held.lock() {
            held.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let locks = RevisionLocks::new();
        let id = Uuid::new_v4();

        let guard = locks.acquire(id).unwrap();
        let err = locks.acquire(id).unwrap_err();
        assert_eq!(err.code(), "MODIFICATION_FAILED");

        drop(guard);
        assert!(locks.acquire(id).is_ok());
    }

    #[test]
    fn test_locks_are_per_deliverable() {
        let locks = RevisionLocks::new();
        let _a = locks.acquire(Uuid::new_v4()).unwrap();
        assert!(locks.acquire(Uuid::new_v4()).is_ok());
    }
}
