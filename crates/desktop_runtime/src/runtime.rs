//! The desktop runtime: single owner of the store, the pointer interaction controller, and the
//! persistence adapter.
//!
//! Every command forwards to [`DesktopStore`] and then drains the queued [`RuntimeEffect`]s:
//! layout changes re-arm the debounced save, theme changes also write immediately. [`tick`]
//! flushes the debounced save once its quiet window has passed.
//!
//! [`tick`]: DesktopRuntime::tick

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use leptos::logging;

use crate::config::DesktopConfig;
use crate::host::DesktopHost;
use crate::interaction::InteractionController;
use crate::model::{
    AppId, DesktopState, OpenWindowRequest, PointerInput, Position, Rect, Size, Theme, WindowId,
    WindowRecord,
};
use crate::persistence::{DecodedDesktop, PersistenceAdapter, PersistenceError};
use crate::reducer::RuntimeEffect;
use crate::store::{DesktopStore, SubscriptionId};

pub struct DesktopRuntime {
    store: DesktopStore,
    interaction: InteractionController,
    persistence: PersistenceAdapter,
    host: DesktopHost,
}

impl DesktopRuntime {
    pub fn new(config: DesktopConfig, host: DesktopHost) -> Self {
        let persistence =
            PersistenceAdapter::new(host.storage(), &config.storage_key, config.save_debounce_ms);
        Self {
            store: DesktopStore::new(config),
            interaction: InteractionController::new(),
            persistence,
            host,
        }
    }

    pub fn store(&self) -> &DesktopStore {
        &self.store
    }

    pub fn state(&self) -> &DesktopState {
        self.store.state()
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn persistence(&self) -> &PersistenceAdapter {
        &self.persistence
    }

    pub fn subscribe(&mut self, callback: impl Fn(&Rc<DesktopState>) + 'static) -> SubscriptionId {
        self.store.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Loads the persisted desktop and hydrates the store. Failures leave the defaults in place.
    pub async fn boot(&mut self) {
        let loaded = self.persistence.load_job().await;
        self.hydrate_loaded(loaded);
    }

    /// Detached load of the persisted desktop, for hosts that cannot hold the runtime across an
    /// await point.
    pub fn load_job(
        &self,
    ) -> LocalBoxFuture<'static, Result<Option<DecodedDesktop>, PersistenceError>> {
        self.persistence.load_job()
    }

    /// Applies the outcome of [`DesktopRuntime::load_job`].
    ///
    /// A record that lost invalid fields is rewritten right away from the repaired state, so the
    /// valid fields survive the next reload.
    pub fn hydrate_loaded(&mut self, loaded: Result<Option<DecodedDesktop>, PersistenceError>) {
        match loaded {
            Ok(Some(decoded)) => {
                let needs_rewrite = decoded.needs_rewrite();
                let restored = decoded.restored;
                let window_count = restored.windows.as_ref().map_or(0, Vec::len);
                if !restored.is_empty() {
                    self.store.hydrate(restored);
                    // Hydration alone never arms a save.
                    self.store.take_effects();
                    logging::log!("desktop hydrated with {window_count} window(s)");
                }
                if needs_rewrite {
                    logging::warn!("rewriting desktop record without its invalid fields");
                    self.host.spawn(self.persistence.save_job(self.store.state()));
                }
            }
            Ok(None) => {}
            Err(err) => logging::warn!("desktop load failed: {err}"),
        }
    }

    /// Routes a pointer sample into the active drag or resize gesture.
    pub fn handle_pointer(&mut self, input: PointerInput) {
        self.interaction.handle_pointer(&mut self.store, input);
        self.run_effects();
    }

    /// Writes the debounced save once its quiet window has elapsed.
    pub fn tick(&mut self) {
        let now = self.host.now_ms();
        if let Some(job) = self.persistence.poll(now, self.store.state()) {
            self.host.spawn(job);
        }
    }

    /// Cancels any pending debounced save and writes the current state right away.
    pub fn flush(&mut self) {
        self.persistence.cancel_scheduled_save();
        self.host.spawn(self.persistence.save_job(self.store.state()));
    }

    fn run_effects(&mut self) {
        for effect in self.store.take_effects() {
            match effect {
                RuntimeEffect::PersistLayout => {
                    self.persistence.schedule_save(self.host.now_ms());
                }
                RuntimeEffect::PersistTheme => {
                    self.host.spawn(self.persistence.save_job(self.store.state()));
                }
            }
        }
    }

    pub fn open_window(&mut self, request: OpenWindowRequest) -> WindowId {
        let window_id = self.store.open_window(request);
        self.run_effects();
        window_id
    }

    pub fn close_window(&mut self, window_id: &WindowId) {
        self.interaction.release_window(window_id);
        self.store.close_window(window_id);
        self.run_effects();
    }

    pub fn focus_window(&mut self, window_id: &WindowId) {
        self.store.focus_window(window_id);
        self.run_effects();
    }

    pub fn minimize_window(&mut self, window_id: &WindowId) {
        self.interaction.release_window(window_id);
        self.store.minimize_window(window_id);
        self.run_effects();
    }

    pub fn restore_window(&mut self, window_id: &WindowId) {
        self.store.restore_window(window_id);
        self.run_effects();
    }

    pub fn maximize_window(&mut self, window_id: &WindowId) {
        self.store.maximize_window(window_id);
        self.run_effects();
    }

    pub fn center_window(&mut self, window_id: &WindowId) {
        self.store.center_window(window_id);
        self.run_effects();
    }

    pub fn toggle_taskbar_window(&mut self, window_id: &WindowId) {
        self.store.toggle_taskbar_window(window_id);
        self.run_effects();
    }

    pub fn cycle_focus(&mut self) {
        self.store.cycle_focus();
        self.run_effects();
    }

    pub fn update_window_position(&mut self, window_id: &WindowId, position: Position) {
        self.store.update_window_position(window_id, position);
        self.run_effects();
    }

    pub fn update_window_size(&mut self, window_id: &WindowId, size: Size) {
        self.store.update_window_size(window_id, size);
        self.run_effects();
    }

    pub fn set_window_rect(&mut self, window_id: &WindowId, rect: Rect) {
        self.store.set_window_rect(window_id, rect);
        self.run_effects();
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.store.set_theme(theme);
        self.run_effects();
    }

    pub fn update_desktop_size(&mut self, size: Size) {
        self.store.update_desktop_size(size);
        self.run_effects();
    }

    pub fn set_icon_positions(&mut self, positions: BTreeMap<AppId, Position>) {
        self.store.set_icon_positions(positions);
        self.run_effects();
    }

    pub fn update_icon_position(&mut self, app_id: impl Into<AppId>, position: Position) {
        self.store.update_icon_position(app_id, position);
        self.run_effects();
    }

    pub fn arrange_icons(&mut self, app_ids: &[AppId]) {
        self.store.arrange_icons(app_ids);
        self.run_effects();
    }

    pub fn set_selected_icons(&mut self, app_ids: BTreeSet<AppId>) {
        self.store.set_selected_icons(app_ids);
        self.run_effects();
    }

    pub fn clear_selected_icons(&mut self) {
        self.store.clear_selected_icons();
        self.run_effects();
    }

    pub fn window(&self, window_id: &WindowId) -> Option<&WindowRecord> {
        self.store.window(window_id)
    }

    pub fn focused_window(&self) -> Option<&WindowRecord> {
        self.store.focused_window()
    }

    pub fn windows_in_stack_order(&self) -> Vec<&WindowRecord> {
        self.store.windows_in_stack_order()
    }

    pub fn overlapping_windows(&self, window_id: &WindowId) -> Vec<&WindowRecord> {
        self.store.overlapping_windows(window_id)
    }
}
