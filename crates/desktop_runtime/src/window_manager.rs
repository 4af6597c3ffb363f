//! Focus and z-order helpers shared by the desktop reducer.
//!
//! Invariants kept here: at most one window is focused, the focused window is never minimized,
//! and every window holds a distinct z-index taken from the monotonically increasing
//! `next_z_index` counter.

use std::collections::HashSet;

use crate::config::DesktopConfig;
use crate::model::{DesktopState, WindowId};

/// Focuses, un-minimizes, and raises `window_id` above every other window.
///
/// Always consumes a fresh z-index, even when the window is already focused on top.
/// Returns `false` when the window does not exist.
pub fn focus_window_internal(state: &mut DesktopState, window_id: &WindowId) -> bool {
    if !state.contains_window(window_id) {
        return false;
    }

    let z_index = allocate_z_index(state);
    for window in &mut state.windows {
        window.is_focused = false;
    }
    if let Some(window) = state.window_mut(window_id) {
        window.is_focused = true;
        window.is_minimized = false;
        window.z_index = z_index;
    }
    state.focused_window_id = Some(window_id.clone());
    true
}

/// Hands focus to the highest non-minimized window, or clears it when every window is hidden.
pub fn focus_topmost_visible(state: &mut DesktopState) {
    let successor = state
        .windows
        .iter()
        .filter(|w| !w.is_minimized)
        .max_by_key(|w| w.z_index)
        .map(|w| w.id.clone());

    for window in &mut state.windows {
        window.is_focused = successor.as_ref() == Some(&window.id);
    }
    state.focused_window_id = successor;
}

/// Takes the current z-index counter value and advances it.
pub fn allocate_z_index(state: &mut DesktopState) -> u32 {
    let z_index = state.next_z_index;
    state.next_z_index = state.next_z_index.saturating_add(1);
    z_index
}

/// Generates a window id that is not used by any live window.
pub fn next_window_id(state: &mut DesktopState) -> WindowId {
    loop {
        let candidate = WindowId(format!("window-{}", state.next_window_seq));
        state.next_window_seq = state.next_window_seq.saturating_add(1);
        if !state.contains_window(&candidate) {
            return candidate;
        }
    }
}

/// Repairs a restored window list so every stack/focus invariant holds again.
///
/// Valid input is left untouched. Duplicate ids keep their first occurrence, colliding z-indices
/// are reassigned in ascending order above the chrome layer, and focus falls back to the topmost
/// visible window when it is missing, duplicated, or held by a minimized window.
pub fn normalize_window_stack(state: &mut DesktopState, config: &DesktopConfig) {
    let mut seen = HashSet::new();
    state.windows.retain(|w| seen.insert(w.id.clone()));

    let floor = config.chrome_z_index + 1;
    let mut z_seen = HashSet::new();
    let z_conflict = state
        .windows
        .iter()
        .any(|w| w.z_index < floor || !z_seen.insert(w.z_index));
    if z_conflict {
        let mut order: Vec<usize> = (0..state.windows.len()).collect();
        order.sort_by_key(|idx| state.windows[*idx].z_index);
        for (rank, idx) in order.into_iter().enumerate() {
            state.windows[idx].z_index = floor + rank as u32;
        }
    }

    let max_z = state.windows.iter().map(|w| w.z_index).max().unwrap_or(0);
    state.next_z_index = state.next_z_index.max(floor).max(max_z.saturating_add(1));
    state.reindex();

    for window in &mut state.windows {
        if window.is_minimized {
            window.is_focused = false;
        }
    }
    let mut focused = state
        .windows
        .iter()
        .filter(|w| w.is_focused)
        .map(|w| w.id.clone());
    let sole_focus = match (focused.next(), focused.next()) {
        (Some(id), None) => Some(id),
        _ => None,
    };
    match sole_focus {
        Some(id) => state.focused_window_id = Some(id),
        None => focus_topmost_visible(state),
    }
}
