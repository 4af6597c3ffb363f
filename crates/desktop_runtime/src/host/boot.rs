use std::{cell::RefCell, rc::Rc, time::Duration};

use leptos::{logging, set_interval_with_handle, spawn_local, IntervalHandle};
use wasm_bindgen::JsValue;

use crate::runtime::DesktopRuntime;

/// How often the browser runtime checks for a due debounced save.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Hydrates `runtime` from storage and starts the timer that flushes debounced saves.
///
/// Drop or clear the returned handle to stop the timer.
pub fn install_browser_runtime(
    runtime: Rc<RefCell<DesktopRuntime>>,
) -> Result<IntervalHandle, JsValue> {
    let load = runtime.borrow().load_job();
    let boot_runtime = Rc::clone(&runtime);
    spawn_local(async move {
        let loaded = load.await;
        match boot_runtime.try_borrow_mut() {
            Ok(mut runtime) => runtime.hydrate_loaded(loaded),
            Err(_) => logging::warn!("desktop runtime busy during boot hydration"),
        }
    });

    set_interval_with_handle(
        move || {
            if let Ok(mut runtime) = runtime.try_borrow_mut() {
                runtime.tick();
            }
        },
        TICK_INTERVAL,
    )
}
