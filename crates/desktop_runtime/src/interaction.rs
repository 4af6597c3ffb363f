//! Drag and resize gesture sessions.
//!
//! The controller turns a pointer stream into `update_window_position` (drag) and
//! `set_window_rect` (resize) commands on the [`DesktopStore`], one commit per pointer sample.
//! One drag and one resize session exist at most; a pointer-down while any gesture is active is
//! ignored.

use leptos::logging;

use crate::geometry::{calculate_resize, constrain_position, constrain_size, snap_to_edge};
use crate::model::{
    DragSession, InteractionState, PointerInput, PointerPosition, Rect, ResizeHandle,
    ResizeSession, WindowId,
};
use crate::store::DesktopStore;

#[derive(Debug, Default)]
pub struct InteractionController {
    state: InteractionState,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    /// Routes one pointer sample to the active gesture.
    pub fn handle_pointer(&mut self, store: &mut DesktopStore, input: PointerInput) {
        match input {
            PointerInput::Down {
                window_id,
                handle: Some(handle),
                pointer,
            } => {
                self.begin_resize(store, window_id, handle, pointer);
            }
            PointerInput::Down {
                window_id,
                handle: None,
                pointer,
            } => {
                self.begin_drag(store, window_id, pointer);
            }
            PointerInput::Move { pointer } => self.pointer_move(store, pointer),
            PointerInput::Up { .. } => self.end(),
            PointerInput::Cancel => self.cancel(),
        }
    }

    /// Focuses `window_id` and starts tracking a move gesture.
    ///
    /// Returns `false` when another gesture is active or the window does not exist.
    pub fn begin_drag(
        &mut self,
        store: &mut DesktopStore,
        window_id: WindowId,
        pointer: PointerPosition,
    ) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        let Some(position_start) = store.window(&window_id).map(|w| w.position) else {
            return false;
        };
        store.focus_window(&window_id);
        self.state.dragging = Some(DragSession {
            window_id,
            pointer_start: pointer,
            position_start,
        });
        true
    }

    /// Focuses `window_id` and starts tracking a resize gesture on `handle`.
    pub fn begin_resize(
        &mut self,
        store: &mut DesktopStore,
        window_id: WindowId,
        handle: ResizeHandle,
        pointer: PointerPosition,
    ) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        let Some(rect_start) = store.window(&window_id).map(|w| w.rect()) else {
            return false;
        };
        store.focus_window(&window_id);
        self.state.resizing = Some(ResizeSession {
            window_id,
            handle,
            pointer_start: pointer,
            rect_start,
        });
        true
    }

    /// Applies the latest pointer sample. Idle controllers ignore it.
    pub fn pointer_move(&mut self, store: &mut DesktopStore, pointer: PointerPosition) {
        if let Some(session) = self.state.dragging.clone() {
            let Some(size) = store.window(&session.window_id).map(|w| w.size) else {
                logging::debug_warn!("drag target {} vanished", session.window_id);
                self.end();
                return;
            };
            let (dx, dy) = pointer.delta_from(session.pointer_start);
            let bounds = store.desktop_bounds();
            let candidate = session.position_start.offset(dx, dy);
            let clamped = constrain_position(candidate, size, bounds);
            let snapped = snap_to_edge(clamped, size, bounds, store.config().snap_threshold);
            store.update_window_position(&session.window_id, snapped);
        } else if let Some(session) = self.state.resizing.clone() {
            if !store.state().contains_window(&session.window_id) {
                logging::debug_warn!("resize target {} vanished", session.window_id);
                self.end();
                return;
            }
            let bounds = store.desktop_bounds();
            let min_size = store.config().min_window_size;
            let rect = calculate_resize(
                session.handle,
                session.pointer_start,
                pointer,
                session.rect_start,
                min_size,
            );
            let size = constrain_size(rect.size, min_size, bounds);
            let position = constrain_position(rect.position, size, bounds);
            store.set_window_rect(&session.window_id, Rect::new(position, size));
        }
    }

    /// Finishes the active gesture. The last applied geometry stays.
    pub fn end(&mut self) {
        self.state = InteractionState::default();
    }

    /// Aborts the active gesture without rollback.
    pub fn cancel(&mut self) {
        if !self.state.is_idle() {
            logging::debug_warn!("pointer gesture cancelled");
        }
        self.end();
    }

    /// Ends any gesture targeting `window_id`, e.g. when that window is closed mid-gesture.
    pub fn release_window(&mut self, window_id: &WindowId) {
        let dragging = self
            .state
            .dragging
            .as_ref()
            .is_some_and(|s| s.window_id == *window_id);
        let resizing = self
            .state
            .resizing
            .as_ref()
            .is_some_and(|s| s.window_id == *window_id);
        if dragging || resizing {
            self.end();
        }
    }
}
