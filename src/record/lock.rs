//! Per-record serialization
//!
//! At most one `RecordLock` exists per id at any time. Locks on
//! different ids never contend beyond the short table mutex.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

use super::types::RecordId;

/// Table of currently held record ids
#[derive(Debug, Default)]
pub struct LockTable {
    held: Mutex<HashSet<RecordId>>,
    released: Condvar,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `id` is free, then hold it until the guard drops.
    pub fn lock(&self, id: RecordId) -> RecordLock<'_> {
        // The set carries no invariant a panicking holder could break.
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(&id) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(id);
        RecordLock { table: self, id }
    }

    /// Whether `id` is currently held
    pub fn is_locked(&self, id: RecordId) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    fn release(&self, id: RecordId) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        held.remove(&id);
        drop(held);
        self.released.notify_all();
    }
}

/// Guard serializing mutations of one record
#[derive(Debug)]
pub struct RecordLock<'a> {
    table: &'a LockTable,
    id: RecordId,
}

impl RecordLock<'_> {
    pub fn id(&self) -> RecordId {
        self.id
    }
}

impl Drop for RecordLock<'_> {
    fn drop(&mut self) {
        self.table.release(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_lock_released_on_drop() {
        let table = LockTable::new();
        {
            let guard = table.lock(RecordId(1));
            assert_eq!(guard.id(), RecordId(1));
            assert!(table.is_locked(RecordId(1)));
        }
        assert!(!table.is_locked(RecordId(1)));
    }

    #[test]
    fn test_different_ids_do_not_block() {
        let table = LockTable::new();
        let _a = table.lock(RecordId(1));
        let _b = table.lock(RecordId(2));
        assert!(table.is_locked(RecordId(1)));
        assert!(table.is_locked(RecordId(2)));
    }

    #[test]
    fn test_same_id_is_serialized() {
        let table = Arc::new(LockTable::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let table = Arc::clone(&table);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    for _ in 0..20 {
                        let _guard = table.lock(RecordId(9));
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(50));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
