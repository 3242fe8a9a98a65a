//! In-memory availability-window store for development and testing.
//!
//! Each bulk operation runs under a single mutex critical section, which gives
//! it the same all-or-nothing behavior as a single SQL statement. The store
//! also models a client-side connection so that dropped connections and
//! injected failures can be exercised without a database.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::core::{
    ArchiveCriteria, AvailabilityWindow, Connection, PurgeCriteria, StorageError, WindowStore,
};

/// In-memory window store with a simulated connection.
#[derive(Debug, Default)]
pub struct InMemoryWindowStore {
    windows: Mutex<HashMap<Uuid, AvailabilityWindow>>,
    connected: AtomicBool,
    /// Server side dropped the connection; the client has not noticed yet.
    stale: AtomicBool,
    faults: Mutex<VecDeque<StorageError>>,
    disconnect_faults: Mutex<VecDeque<StorageError>>,
    connects: AtomicU64,
    disconnects: AtomicU64,
    operations: AtomicU64,
}

impl InMemoryWindowStore {
    /// Create an empty, disconnected store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `windows`.
    pub fn with_windows(windows: impl IntoIterator<Item = AvailabilityWindow>) -> Self {
        let store = Self::new();
        for window in windows {
            store.insert(window);
        }
        store
    }

    /// Insert or replace a window.
    pub fn insert(&self, window: AvailabilityWindow) {
        self.windows.lock().insert(window.id, window);
    }

    /// Fetch a window by id.
    pub fn get(&self, id: &Uuid) -> Option<AvailabilityWindow> {
        self.windows.lock().get(id).cloned()
    }

    /// Snapshot of all windows ordered by start time.
    pub fn windows(&self) -> Vec<AvailabilityWindow> {
        let mut windows: Vec<_> = self.windows.lock().values().cloned().collect();
        windows.sort_by_key(|w| (w.starts_at, w.id));
        windows
    }

    /// Number of stored windows.
    pub fn len(&self) -> usize {
        self.windows.lock().len()
    }

    /// Whether the store holds no windows.
    pub fn is_empty(&self) -> bool {
        self.windows.lock().is_empty()
    }

    /// Simulate the server closing the connection. The next operation fails
    /// with [`StorageError::ConnectionClosed`] until the client reconnects.
    pub fn drop_connection(&self) {
        self.stale.store(true, Ordering::Release);
    }

    /// Fail the next bulk operation with `error` before it touches any data.
    pub fn inject_fault(&self, error: StorageError) {
        self.faults.lock().push_back(error);
    }

    /// Fail the next `disconnect` call with `error`.
    pub fn inject_disconnect_fault(&self, error: StorageError) {
        self.disconnect_faults.lock().push_back(error);
    }

    /// Whether the client side considers itself connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Connections actually established so far.
    pub fn connect_count(&self) -> u64 {
        self.connects.load(Ordering::Relaxed)
    }

    /// Disconnect calls so far.
    pub fn disconnect_count(&self) -> u64 {
        self.disconnects.load(Ordering::Relaxed)
    }

    /// Bulk operations attempted so far, including failed ones.
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }

    fn begin_operation(&self) -> Result<(), StorageError> {
        self.operations.fetch_add(1, Ordering::Relaxed);
        if let Some(fault) = self.faults.lock().pop_front() {
            return Err(fault);
        }
        if !self.connected.load(Ordering::Acquire) {
            return Err(StorageError::ConnectionClosed("client is not connected".into()));
        }
        if self.stale.load(Ordering::Acquire) {
            return Err(StorageError::ConnectionClosed(
                "server has closed the connection".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for InMemoryWindowStore {
    async fn connect(&self) -> Result<(), StorageError> {
        if !self.connected.swap(true, Ordering::AcqRel) {
            self.connects.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("in-memory window store connected");
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), StorageError> {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
        self.connected.store(false, Ordering::Release);
        self.stale.store(false, Ordering::Release);
        if let Some(fault) = self.disconnect_faults.lock().pop_front() {
            return Err(fault);
        }
        tracing::debug!("in-memory window store disconnected");
        Ok(())
    }
}

#[async_trait]
impl WindowStore for InMemoryWindowStore {
    async fn archive_matching(&self, criteria: &ArchiveCriteria) -> Result<u64, StorageError> {
        self.begin_operation()?;
        let mut windows = self.windows.lock();
        let mut archived = 0;
        for window in windows.values_mut().filter(|w| criteria.matches(w)) {
            window.archived_at = Some(criteria.archived_at);
            archived += 1;
        }
        Ok(archived)
    }

    async fn purge_matching(&self, criteria: &PurgeCriteria) -> Result<u64, StorageError> {
        self.begin_operation()?;
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, w| !criteria.matches(w));
        Ok((before - windows.len()) as u64)
    }
}
