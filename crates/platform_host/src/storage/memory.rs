//! In-memory [`DesktopStorage`] adapter for tests and non-browser hosts.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use super::{DesktopStorage, StorageError, StorageFuture};

#[derive(Debug, Clone, Default)]
/// In-memory storage keyed by string.
///
/// Clones share the same entries, so a test can keep one handle while the runtime owns another.
/// Reads, writes and deletes can each be made to fail with [`MemoryStorage::fail_reads_with`],
/// [`MemoryStorage::fail_writes_with`] and [`MemoryStorage::fail_deletes_with`].
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
    read_failure: Rc<RefCell<Option<StorageError>>>,
    write_failure: Rc<RefCell<Option<StorageError>>>,
    delete_failure: Rc<RefCell<Option<StorageError>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStorage {
    /// Returns a copy of the raw text stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    /// Stores raw text directly, bypassing failure injection.
    pub fn insert_raw(&self, key: impl Into<String>, raw: impl Into<String>) {
        self.entries.borrow_mut().insert(key.into(), raw.into());
    }

    /// Makes every subsequent load fail with `error` (`None` restores normal reads).
    pub fn fail_reads_with(&self, error: Option<StorageError>) {
        *self.read_failure.borrow_mut() = error;
    }

    /// Makes every subsequent save fail with `error` (`None` restores normal writes).
    pub fn fail_writes_with(&self, error: Option<StorageError>) {
        *self.write_failure.borrow_mut() = error;
    }

    /// Makes every subsequent delete fail with `error` (`None` restores normal deletes).
    pub fn fail_deletes_with(&self, error: Option<StorageError>) {
        *self.delete_failure.borrow_mut() = error;
    }

    /// Number of successful saves performed so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl DesktopStorage for MemoryStorage {
    fn load_entry<'a>(
        &'a self,
        key: &'a str,
    ) -> StorageFuture<'a, Result<Option<String>, StorageError>> {
        Box::pin(async move {
            if let Some(err) = self.read_failure.borrow().clone() {
                return Err(err);
            }
            Ok(self.entries.borrow().get(key).cloned())
        })
    }

    fn save_entry<'a>(
        &'a self,
        key: &'a str,
        raw: &'a str,
    ) -> StorageFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            if let Some(err) = self.write_failure.borrow().clone() {
                return Err(err);
            }
            self.entries
                .borrow_mut()
                .insert(key.to_string(), raw.to_string());
            self.writes.set(self.writes.get() + 1);
            Ok(())
        })
    }

    fn delete_entry<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            if let Some(err) = self.delete_failure.borrow().clone() {
                return Err(err);
            }
            self.entries.borrow_mut().remove(key);
            Ok(())
        })
    }
}
