//! Typed host contracts shared by the desktop runtime and its browser adapters.
//!
//! This crate is the API-first boundary for durable storage. Concrete browser adapters live in
//! `platform_host_web`; in-memory adapters for tests and non-browser hosts live here.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod storage;
pub mod time;

pub use storage::memory::MemoryStorage;
pub use storage::{DesktopStorage, StorageError, StorageFuture};
pub use time::unix_time_ms_now;
