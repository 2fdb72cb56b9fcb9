use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

type LockKey = (Uuid, NaiveDate);

/// Idle entries are pruned once the registry grows past this.
const PRUNE_THRESHOLD: usize = 1024;

/// Per-(doctor, date) mutual exclusion for the check-then-write booking paths.
///
/// One registry is built at startup and shared by every service that mutates
/// a doctor's day. The guard must be held from the availability recompute
/// until the row is written.
#[derive(Default)]
pub struct SlotLocks {
    entries: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, doctor_id: Uuid, date: NaiveDate) -> OwnedMutexGuard<()> {
        let lock = {
            // A poisoned map is still structurally valid.
            let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if entries.len() >= PRUNE_THRESHOLD {
                entries.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            entries
                .entry((doctor_id, date))
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}
