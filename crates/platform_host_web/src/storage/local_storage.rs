//! `localStorage`-backed [`DesktopStorage`] implementation.
//!
//! The browser API is synchronous; the async trait methods resolve on first poll. Non-wasm
//! targets compile to a store that holds nothing and accepts every write.

use platform_host::{DesktopStorage, StorageError, StorageFuture};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{JsCast, JsValue};

#[derive(Debug, Clone, Copy, Default)]
/// Browser storage backed by `window.localStorage`.
pub struct LocalStorage;

impl LocalStorage {
    /// Reads the raw text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when localStorage cannot be reached.
    pub fn read(self, key: &str) -> Result<Option<String>, StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_storage()?;
            storage
                .get_item(key)
                .map_err(|e| StorageError::Backend(format!("localStorage get_item failed: {e:?}")))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(None)
        }
    }

    /// Writes raw text under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::QuotaExceeded`] when the browser rejects the write for size,
    /// [`StorageError::Unavailable`] when localStorage cannot be reached.
    pub fn write(self, key: &str, raw: &str) -> Result<(), StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_storage()?;
            storage.set_item(key, raw).map_err(classify_write_error)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, raw);
            Ok(())
        }
    }

    /// Removes `key` from localStorage.
    ///
    /// # Errors
    ///
    /// Returns an error when localStorage is unavailable or the removal fails.
    pub fn remove(self, key: &str) -> Result<(), StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_storage()?;
            storage.remove_item(key).map_err(|e| {
                StorageError::Backend(format!("localStorage remove_item failed: {e:?}"))
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn web_storage() -> Result<web_sys::Storage, StorageError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or(StorageError::Unavailable)
}

#[cfg(target_arch = "wasm32")]
fn classify_write_error(err: JsValue) -> StorageError {
    match err.dyn_ref::<web_sys::DomException>() {
        Some(exception)
            if exception.name() == "QuotaExceededError"
                || exception.name() == "NS_ERROR_DOM_QUOTA_REACHED" =>
        {
            StorageError::QuotaExceeded
        }
        _ => StorageError::Backend(format!("localStorage set_item failed: {err:?}")),
    }
}

impl DesktopStorage for LocalStorage {
    fn load_entry<'a>(
        &'a self,
        key: &'a str,
    ) -> StorageFuture<'a, Result<Option<String>, StorageError>> {
        let storage = *self;
        Box::pin(async move { storage.read(key) })
    }

    fn save_entry<'a>(
        &'a self,
        key: &'a str,
        raw: &'a str,
    ) -> StorageFuture<'a, Result<(), StorageError>> {
        let storage = *self;
        Box::pin(async move { storage.write(key, raw) })
    }

    fn delete_entry<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<(), StorageError>> {
        let storage = *self;
        Box::pin(async move { storage.remove(key) })
    }
}
