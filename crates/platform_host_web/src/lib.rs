//! Browser (`wasm32`) implementations of [`platform_host`] service contracts.
//!
//! The desktop runtime only needs durable key/value storage, provided here by
//! [`LocalStorage`]. Hosts obtain it through [`desktop_storage`] so the concrete adapter can
//! change without touching runtime wiring.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod storage;

use std::rc::Rc;

use platform_host::DesktopStorage;

pub use storage::local_storage::LocalStorage;

/// Returns the durable storage adapter for browser hosts.
pub fn desktop_storage() -> Rc<dyn DesktopStorage> {
    Rc::new(LocalStorage)
}
