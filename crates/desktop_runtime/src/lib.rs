//! Window manager core for a browser desktop: window state store, geometry engine, pointer
//! gesture sessions, and a debounced durable mirror of the layout.
//!
//! The rendering layer owns a [`DesktopRuntime`], issues commands to it, forwards pointer input
//! through [`DesktopRuntime::handle_pointer`], and subscribes for full [`DesktopState`] snapshots.

pub mod config;
pub mod geometry;
pub mod host;
pub mod interaction;
pub mod model;
pub mod persistence;
pub mod reducer;
pub mod runtime;
pub mod store;
mod window_manager;

pub use config::{CascadeConfig, ConfigError, DesktopConfig, DEFAULT_STORAGE_KEY};
pub use host::{Clock, DesktopHost};
#[cfg(target_arch = "wasm32")]
pub use host::install_browser_runtime;
pub use interaction::InteractionController;
pub use model::*;
pub use persistence::{
    decode_desktop, encode_desktop, DecodedDesktop, PersistenceAdapter, PersistenceError,
    SaveSchedule,
};
pub use reducer::{reduce_desktop, DesktopAction, ReducerError, RuntimeEffect};
pub use runtime::DesktopRuntime;
pub use store::{DesktopStore, SubscriptionId};
