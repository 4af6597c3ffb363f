//! The desktop store: single owner of [`DesktopState`], command surface, and subscriber fan-out.
//!
//! Every command runs [`reduce_desktop`] against a working copy and commits it only when the
//! reducer succeeds, so subscribers never observe a partially applied command. All subscribers
//! receive the same shared post-command snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use leptos::logging;

use crate::config::DesktopConfig;
use crate::geometry::{desktop_bounds, icon_grid_position, is_overlapping};
use crate::model::{
    AppId, DesktopState, OpenWindowRequest, Position, Rect, RestoredDesktop, Size, Theme,
    WindowId, WindowRecord,
};
use crate::reducer::{reduce_desktop, DesktopAction, RuntimeEffect};
use crate::window_manager::next_window_id;

/// Grid cell used when laying out desktop icons.
pub const ICON_CELL: Size = Size {
    width: 96,
    height: 104,
};
/// Top-left corner of the icon grid.
pub const ICON_GRID_ORIGIN: Position = Position { x: 16, y: 16 };

type Subscriber = Box<dyn Fn(&Rc<DesktopState>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Handle returned by [`DesktopStore::subscribe`].
pub struct SubscriptionId(u64);

pub struct DesktopStore {
    config: DesktopConfig,
    state: DesktopState,
    snapshot: Rc<DesktopState>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    effects: Vec<RuntimeEffect>,
}

impl DesktopStore {
    pub fn new(config: DesktopConfig) -> Self {
        let state = DesktopState::new(&config);
        Self {
            snapshot: Rc::new(state.clone()),
            state,
            config,
            subscribers: Vec::new(),
            next_subscription: 1,
            effects: Vec::new(),
        }
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    pub fn state(&self) -> &DesktopState {
        &self.state
    }

    /// Shared snapshot of the last committed state.
    pub fn snapshot(&self) -> Rc<DesktopState> {
        Rc::clone(&self.snapshot)
    }

    /// Registers `callback` to receive the snapshot after every committed change.
    ///
    /// Callbacks run synchronously inside the command that caused the change and must not call
    /// back into the store.
    pub fn subscribe(&mut self, callback: impl Fn(&Rc<DesktopState>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    /// Drains runtime effects produced by committed commands.
    pub fn take_effects(&mut self) -> Vec<RuntimeEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Applies `action` atomically and notifies subscribers when the state changed.
    ///
    /// Actions referencing unknown windows are ignored. Returns whether anything was committed.
    pub fn dispatch(&mut self, action: DesktopAction) -> bool {
        let next = self.state.clone();
        self.commit(next, action)
    }

    /// Reduces `action` on the working copy `next` and commits the result.
    fn commit(&mut self, mut next: DesktopState, action: DesktopAction) -> bool {
        let effects = match reduce_desktop(&mut next, &self.config, action) {
            Ok(effects) => effects,
            Err(err) => {
                logging::debug_warn!("desktop command ignored: {err}");
                return false;
            }
        };
        if next == self.state {
            return false;
        }

        self.state = next;
        self.effects.extend(effects);
        if !self.effects.contains(&RuntimeEffect::PersistLayout) {
            self.effects.push(RuntimeEffect::PersistLayout);
        }
        self.snapshot = Rc::new(self.state.clone());
        for (_, subscriber) in &self.subscribers {
            subscriber(&self.snapshot);
        }
        true
    }

    /// Opens a window and returns its id. An id already in use focuses that window instead.
    ///
    /// A generated id is drawn from the working copy, so the id counter advances in the same
    /// commit that adds the window.
    pub fn open_window(&mut self, mut request: OpenWindowRequest) -> WindowId {
        let mut next = self.state.clone();
        let window_id = match request.id.clone() {
            Some(id) => id,
            None => next_window_id(&mut next),
        };
        request.id = Some(window_id.clone());
        self.commit(next, DesktopAction::OpenWindow(request));
        window_id
    }

    pub fn close_window(&mut self, window_id: &WindowId) {
        self.dispatch(DesktopAction::CloseWindow {
            window_id: window_id.clone(),
        });
    }

    pub fn focus_window(&mut self, window_id: &WindowId) {
        self.dispatch(DesktopAction::FocusWindow {
            window_id: window_id.clone(),
        });
    }

    pub fn minimize_window(&mut self, window_id: &WindowId) {
        self.dispatch(DesktopAction::MinimizeWindow {
            window_id: window_id.clone(),
        });
    }

    pub fn restore_window(&mut self, window_id: &WindowId) {
        self.dispatch(DesktopAction::RestoreWindow {
            window_id: window_id.clone(),
        });
    }

    pub fn maximize_window(&mut self, window_id: &WindowId) {
        self.dispatch(DesktopAction::MaximizeWindow {
            window_id: window_id.clone(),
        });
    }

    pub fn center_window(&mut self, window_id: &WindowId) {
        self.dispatch(DesktopAction::CenterWindow {
            window_id: window_id.clone(),
        });
    }

    pub fn toggle_taskbar_window(&mut self, window_id: &WindowId) {
        self.dispatch(DesktopAction::ToggleTaskbarWindow {
            window_id: window_id.clone(),
        });
    }

    pub fn cycle_focus(&mut self) {
        self.dispatch(DesktopAction::CycleFocus);
    }

    pub fn update_window_position(&mut self, window_id: &WindowId, position: Position) {
        self.dispatch(DesktopAction::UpdateWindowPosition {
            window_id: window_id.clone(),
            position,
        });
    }

    pub fn update_window_size(&mut self, window_id: &WindowId, size: Size) {
        self.dispatch(DesktopAction::UpdateWindowSize {
            window_id: window_id.clone(),
            size,
        });
    }

    /// Moves and resizes a window in a single commit.
    pub fn set_window_rect(&mut self, window_id: &WindowId, rect: Rect) {
        self.dispatch(DesktopAction::SetWindowRect {
            window_id: window_id.clone(),
            rect,
        });
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.dispatch(DesktopAction::SetTheme { theme });
    }

    pub fn update_desktop_size(&mut self, size: Size) {
        self.dispatch(DesktopAction::UpdateDesktopSize { size });
    }

    pub fn set_icon_positions(&mut self, positions: BTreeMap<AppId, Position>) {
        self.dispatch(DesktopAction::SetIconPositions { positions });
    }

    pub fn update_icon_position(&mut self, app_id: impl Into<AppId>, position: Position) {
        self.dispatch(DesktopAction::UpdateIconPosition {
            app_id: app_id.into(),
            position,
        });
    }

    pub fn set_selected_icons(&mut self, app_ids: BTreeSet<AppId>) {
        self.dispatch(DesktopAction::SetSelectedIcons { app_ids });
    }

    pub fn clear_selected_icons(&mut self) {
        self.dispatch(DesktopAction::ClearSelectedIcons);
    }

    pub fn hydrate(&mut self, restored: RestoredDesktop) {
        self.dispatch(DesktopAction::Hydrate { restored });
    }

    /// Lays `app_ids` out on the icon grid, replacing any stored icon positions.
    pub fn arrange_icons(&mut self, app_ids: &[AppId]) {
        let positions = self.default_icon_positions(app_ids);
        self.set_icon_positions(positions);
    }

    /// Grid slots for `app_ids`, filling columns top to bottom within the desktop height.
    pub fn default_icon_positions(&self, app_ids: &[AppId]) -> BTreeMap<AppId, Position> {
        let bounds = self.desktop_bounds();
        let rows = ((bounds.height - ICON_GRID_ORIGIN.y) / ICON_CELL.height).max(1) as usize;
        app_ids
            .iter()
            .enumerate()
            .map(|(idx, app_id)| {
                (
                    app_id.clone(),
                    icon_grid_position(idx, rows, ICON_CELL, ICON_GRID_ORIGIN),
                )
            })
            .collect()
    }

    pub fn window(&self, window_id: &WindowId) -> Option<&WindowRecord> {
        self.state.window(window_id)
    }

    pub fn focused_window(&self) -> Option<&WindowRecord> {
        self.state.focused_window()
    }

    pub fn windows_in_stack_order(&self) -> Vec<&WindowRecord> {
        self.state.windows_in_stack_order()
    }

    /// Visible windows whose bounds intersect `window_id`.
    pub fn overlapping_windows(&self, window_id: &WindowId) -> Vec<&WindowRecord> {
        let Some(target) = self.state.window(window_id) else {
            return Vec::new();
        };
        let target_rect = target.rect();
        self.state
            .windows
            .iter()
            .filter(|w| w.id != *window_id && !w.is_minimized)
            .filter(|w| is_overlapping(target_rect, w.rect()))
            .collect()
    }

    /// Area windows may occupy: the viewport minus the taskbar band.
    pub fn desktop_bounds(&self) -> Size {
        desktop_bounds(self.state.viewport_size, self.config.chrome_height)
    }
}

impl Default for DesktopStore {
    fn default() -> Self {
        Self::new(DesktopConfig::default())
    }
}
