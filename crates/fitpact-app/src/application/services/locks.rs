use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Per-key mutual exclusion for record-level read-modify-write cycles.
///
/// Each deposit record and each contract is an independently lockable unit
/// of mutation; handles are created on demand and shared for the lifetime
/// of the registry, so two tasks asking for the same key always contend on
/// the same mutex while operations on different keys proceed in parallel.
#[derive(Default)]
pub struct KeyedLocks {
    handles: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the lock handle for a key. The returned mutex must
    /// be held across the whole read-modify-write of the keyed record.
    pub fn handle(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut handles = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        handles.entry(key.to_string()).or_default().clone()
    }
}
