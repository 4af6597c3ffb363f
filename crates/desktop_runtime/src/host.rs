//! Host services injected into the desktop runtime: durable storage, a millisecond clock, and a
//! way to run detached storage jobs.
//!
//! Browser hosts use [`DesktopHost::browser`]. Tests and non-browser hosts build one with
//! [`DesktopHost::new`] around a [`platform_host::MemoryStorage`] and a controllable clock.

#[cfg(target_arch = "wasm32")]
mod boot;

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use platform_host::{unix_time_ms_now, DesktopStorage};

#[cfg(target_arch = "wasm32")]
pub use boot::install_browser_runtime;

/// Millisecond clock used for debounce deadlines.
pub type Clock = Rc<dyn Fn() -> u64>;

#[derive(Clone)]
/// Host service bundle for the desktop runtime.
pub struct DesktopHost {
    storage: Rc<dyn DesktopStorage>,
    clock: Clock,
}

impl DesktopHost {
    pub fn new(storage: Rc<dyn DesktopStorage>, clock: Clock) -> Self {
        Self { storage, clock }
    }

    /// `localStorage` plus the wall clock.
    pub fn browser() -> Self {
        Self::new(platform_host_web::desktop_storage(), Rc::new(unix_time_ms_now))
    }

    /// Returns the configured storage service.
    pub fn storage(&self) -> Rc<dyn DesktopStorage> {
        Rc::clone(&self.storage)
    }

    pub fn now_ms(&self) -> u64 {
        (self.clock)()
    }

    /// Runs a detached storage job.
    ///
    /// In the browser the job is queued on the local executor. Elsewhere it completes before this
    /// returns.
    pub fn spawn(&self, job: LocalBoxFuture<'static, ()>) {
        #[cfg(target_arch = "wasm32")]
        {
            leptos::spawn_local(job);
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            futures::executor::block_on(job);
        }
    }
}

impl Default for DesktopHost {
    fn default() -> Self {
        Self::browser()
    }
}
