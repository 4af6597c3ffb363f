//! String-keyed durable storage contracts used by the desktop runtime.
//!
//! Values are stored as raw JSON text per key. Concrete adapters live in
//! `platform_host_web` (browser `localStorage`) and [`memory`] (tests and
//! non-browser hosts).

pub mod memory;

use std::{future::Future, pin::Pin};

use thiserror::Error;

/// Object-safe boxed future used by [`DesktopStorage`] async methods.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failures reported by a [`DesktopStorage`] backend.
pub enum StorageError {
    /// The backing store cannot be reached (disabled, private mode, non-browser target).
    #[error("storage unavailable")]
    Unavailable,
    /// The backing store rejected a write because it is full.
    #[error("storage quota exceeded")]
    QuotaExceeded,
    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Host service for raw string entries addressed by a fixed key.
pub trait DesktopStorage {
    /// Loads the raw text stored under `key`.
    fn load_entry<'a>(&'a self, key: &'a str)
        -> StorageFuture<'a, Result<Option<String>, StorageError>>;

    /// Replaces the raw text stored under `key`.
    fn save_entry<'a>(
        &'a self,
        key: &'a str,
        raw: &'a str,
    ) -> StorageFuture<'a, Result<(), StorageError>>;

    /// Removes `key` from the store. Removing a missing key succeeds.
    fn delete_entry<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<(), StorageError>>;
}
