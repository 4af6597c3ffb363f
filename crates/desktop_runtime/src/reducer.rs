//! Reducer actions, side-effect intents, and transition logic for the desktop window manager.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::config::DesktopConfig;
use crate::geometry::{cascade_position, desktop_bounds};
use crate::model::{
    AppId, DesktopState, OpenWindowRequest, Position, Rect, RestoredDesktop, Size, Theme,
    WindowId, WindowRecord,
};
use crate::window_manager::{
    focus_topmost_visible, focus_window_internal, next_window_id, normalize_window_stack,
};

/// Share of the available height given to a centered window, in tenths.
const CENTERED_HEIGHT_TENTHS: i32 = 7;

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_desktop`] to mutate [`DesktopState`].
pub enum DesktopAction {
    /// Open a new window (or focus the live window already using the requested id).
    OpenWindow(OpenWindowRequest),
    /// Close a window by id.
    CloseWindow {
        /// Window to close.
        window_id: WindowId,
    },
    /// Focus, un-minimize, and raise a window.
    FocusWindow {
        /// Window to focus.
        window_id: WindowId,
    },
    /// Minimize a window and hand focus to the next visible window.
    MinimizeWindow {
        /// Window to minimize.
        window_id: WindowId,
    },
    /// Restore a minimized window. Same path as focusing it.
    RestoreWindow {
        /// Window to restore.
        window_id: WindowId,
    },
    /// Fill the desktop area above the taskbar.
    MaximizeWindow {
        /// Window to maximize.
        window_id: WindowId,
    },
    /// Resize to half the viewport width and center horizontally.
    CenterWindow {
        /// Window to center.
        window_id: WindowId,
    },
    /// Taskbar button semantics: restore if minimized, minimize if focused, focus otherwise.
    ToggleTaskbarWindow {
        /// Window associated with the taskbar button.
        window_id: WindowId,
    },
    /// Rotate focus to the visible window at the bottom of the stack.
    CycleFocus,
    /// Replace a window position. Callers clamp beforehand.
    UpdateWindowPosition {
        /// Window to move.
        window_id: WindowId,
        /// New top-left corner.
        position: Position,
    },
    /// Replace a window size. Callers clamp beforehand.
    UpdateWindowSize {
        /// Window to resize.
        window_id: WindowId,
        /// New size.
        size: Size,
    },
    /// Replace a window position and size in one transition. Callers clamp beforehand.
    SetWindowRect {
        /// Window to move and resize.
        window_id: WindowId,
        /// New geometry.
        rect: Rect,
    },
    /// Switch the desktop theme.
    SetTheme {
        /// New theme.
        theme: Theme,
    },
    /// Record the current viewport size reported by the host.
    UpdateDesktopSize {
        /// New viewport size.
        size: Size,
    },
    /// Replace every icon position.
    SetIconPositions {
        /// Complete icon layout.
        positions: BTreeMap<AppId, Position>,
    },
    /// Move a single icon.
    UpdateIconPosition {
        /// Icon to move.
        app_id: AppId,
        /// New icon position.
        position: Position,
    },
    /// Replace the icon selection.
    SetSelectedIcons {
        /// Selected icons.
        app_ids: BTreeSet<AppId>,
    },
    /// Deselect every icon.
    ClearSelectedIcons,
    /// Apply validated persisted fields loaded at startup.
    Hydrate {
        /// Fields that passed validation.
        restored: RestoredDesktop,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Side-effect intents executed by the runtime after a command commits.
pub enum RuntimeEffect {
    /// Schedule a debounced save of the persisted projection.
    PersistLayout,
    /// Save the persisted projection right away.
    PersistTheme,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for actions that cannot apply to the current state.
pub enum ReducerError {
    /// The target window id was not found in the current state.
    #[error("window not found: {0}")]
    WindowNotFound(WindowId),
}

/// Applies a [`DesktopAction`] to `state` and collects resulting side effects.
///
/// This is the authoritative state transition engine for the window manager. Every arm leaves
/// the focus and z-order invariants intact.
///
/// # Errors
///
/// Returns [`ReducerError::WindowNotFound`] when an action references a window that is not
/// present. `state` is left unchanged in that case.
pub fn reduce_desktop(
    state: &mut DesktopState,
    config: &DesktopConfig,
    action: DesktopAction,
) -> Result<Vec<RuntimeEffect>, ReducerError> {
    let mut effects = Vec::new();
    match action {
        DesktopAction::OpenWindow(req) => {
            open_window(state, config, req);
        }
        DesktopAction::CloseWindow { window_id } => {
            let index = state
                .windows
                .iter()
                .position(|w| w.id == window_id)
                .ok_or_else(|| ReducerError::WindowNotFound(window_id.clone()))?;
            let closed = state.windows.remove(index);
            state.reindex();
            if closed.is_focused || state.focused_window_id.as_ref() == Some(&closed.id) {
                focus_topmost_visible(state);
            }
        }
        DesktopAction::FocusWindow { window_id } | DesktopAction::RestoreWindow { window_id } => {
            focus_existing(state, &window_id)?;
        }
        DesktopAction::MinimizeWindow { window_id } => {
            minimize_window(state, &window_id)?;
        }
        DesktopAction::MaximizeWindow { window_id } => {
            let size = desktop_bounds(state.viewport_size, config.chrome_height);
            let window = find_window_mut(state, &window_id)?;
            window.position = Position::ORIGIN;
            window.size = size;
        }
        DesktopAction::CenterWindow { window_id } => {
            let viewport = state.viewport_size;
            let bounds = desktop_bounds(viewport, config.chrome_height);
            let width = viewport.width / 2;
            let height =
                (i64::from(bounds.height) * i64::from(CENTERED_HEIGHT_TENTHS) / 10) as i32;
            let window = find_window_mut(state, &window_id)?;
            window.size = Size::new(width, height);
            window.position = Position::new((viewport.width - width) / 2, config.center_top_margin);
        }
        DesktopAction::ToggleTaskbarWindow { window_id } => {
            let window = find_window(state, &window_id)?;
            let (minimized, focused) = (window.is_minimized, window.is_focused);
            if focused && !minimized {
                minimize_window(state, &window_id)?;
            } else {
                focus_existing(state, &window_id)?;
            }
        }
        DesktopAction::CycleFocus => {
            let mut visible: Vec<&WindowRecord> =
                state.windows.iter().filter(|w| !w.is_minimized).collect();
            if visible.len() > 1 {
                visible.sort_by_key(|w| w.z_index);
                let bottom = visible[0].id.clone();
                focus_window_internal(state, &bottom);
            }
        }
        DesktopAction::UpdateWindowPosition {
            window_id,
            position,
        } => {
            find_window_mut(state, &window_id)?.position = position;
        }
        DesktopAction::UpdateWindowSize { window_id, size } => {
            find_window_mut(state, &window_id)?.size = size;
        }
        DesktopAction::SetWindowRect { window_id, rect } => {
            let window = find_window_mut(state, &window_id)?;
            window.position = rect.position;
            window.size = rect.size;
        }
        DesktopAction::SetTheme { theme } => {
            state.theme = theme;
            effects.push(RuntimeEffect::PersistTheme);
        }
        DesktopAction::UpdateDesktopSize { size } => {
            state.viewport_size = size;
        }
        DesktopAction::SetIconPositions { positions } => {
            state.icon_positions = positions;
        }
        DesktopAction::UpdateIconPosition { app_id, position } => {
            let mut positions = state.icon_positions.clone();
            positions.insert(app_id, position);
            state.icon_positions = positions;
        }
        DesktopAction::SetSelectedIcons { app_ids } => {
            state.selected_icon_ids = app_ids;
        }
        DesktopAction::ClearSelectedIcons => {
            state.selected_icon_ids = BTreeSet::new();
        }
        DesktopAction::Hydrate { restored } => {
            if let Some(theme) = restored.theme {
                state.theme = theme;
            }
            if let Some(windows) = restored.windows {
                state.windows = windows;
            }
            if let Some(positions) = restored.icon_positions {
                state.icon_positions = positions;
            }
            normalize_window_stack(state, config);
        }
    }

    Ok(effects)
}

fn open_window(state: &mut DesktopState, config: &DesktopConfig, req: OpenWindowRequest) {
    let window_id = match req.id {
        Some(id) if state.contains_window(&id) => {
            focus_window_internal(state, &id);
            return;
        }
        Some(id) => id,
        None => next_window_id(state),
    };

    let position = req
        .position
        .unwrap_or_else(|| cascade_position(state.windows.len(), &config.cascade));
    state.windows.push(WindowRecord {
        id: window_id.clone(),
        title: req.title,
        component_kind: req.component_kind,
        position,
        size: req.size.unwrap_or(config.default_window_size),
        z_index: 0,
        is_minimized: false,
        is_focused: false,
        payload: req.payload,
    });
    state.reindex();
    focus_window_internal(state, &window_id);
}

fn focus_existing(state: &mut DesktopState, window_id: &WindowId) -> Result<(), ReducerError> {
    if focus_window_internal(state, window_id) {
        Ok(())
    } else {
        Err(ReducerError::WindowNotFound(window_id.clone()))
    }
}

/// Minimizes `window_id` and re-picks focus: the highest non-minimized window always ends up
/// focused, whichever window held focus before.
fn minimize_window(state: &mut DesktopState, window_id: &WindowId) -> Result<(), ReducerError> {
    let window = find_window_mut(state, window_id)?;
    window.is_minimized = true;
    window.is_focused = false;
    focus_topmost_visible(state);
    Ok(())
}

fn find_window<'a>(
    state: &'a DesktopState,
    window_id: &WindowId,
) -> Result<&'a WindowRecord, ReducerError> {
    state
        .window(window_id)
        .ok_or_else(|| ReducerError::WindowNotFound(window_id.clone()))
}

fn find_window_mut<'a>(
    state: &'a mut DesktopState,
    window_id: &WindowId,
) -> Result<&'a mut WindowRecord, ReducerError> {
    state
        .window_mut(window_id)
        .ok_or_else(|| ReducerError::WindowNotFound(window_id.clone()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn reduce(state: &mut DesktopState, action: DesktopAction) -> Vec<RuntimeEffect> {
        reduce_desktop(state, &DesktopConfig::default(), action).expect("reduce")
    }

    fn open(state: &mut DesktopState, title: &str) -> WindowId {
        reduce(
            state,
            DesktopAction::OpenWindow(OpenWindowRequest::new(title, title.to_lowercase())),
        );
        state.windows.last().expect("window").id.clone()
    }

    fn focused_count(state: &DesktopState) -> usize {
        state.windows.iter().filter(|w| w.is_focused).count()
    }

    #[test]
    fn open_window_focuses_new_window_and_claims_counter() {
        let mut state = DesktopState::default();
        let start = state.next_z_index;

        let first = open(&mut state, "About");
        let second = open(&mut state, "Terminal");

        assert_eq!(state.focused_window_id, Some(second.clone()));
        assert_eq!(focused_count(&state), 1);
        assert_eq!(state.window(&first).unwrap().z_index, start);
        assert_eq!(state.window(&second).unwrap().z_index, start + 1);
        assert_eq!(state.next_z_index, start + 2);
        assert_eq!(state.window(&first).unwrap().position, Position::new(50, 50));
        assert_eq!(state.window(&second).unwrap().position, Position::new(80, 80));
        assert_eq!(state.window(&second).unwrap().size, Size::new(640, 480));
    }

    #[test]
    fn open_window_with_live_id_focuses_existing_instead_of_duplicating() {
        let mut state = DesktopState::default();
        reduce(
            &mut state,
            DesktopAction::OpenWindow(OpenWindowRequest::new("About", "about").with_id("about")),
        );
        open(&mut state, "Terminal");
        reduce(
            &mut state,
            DesktopAction::OpenWindow(OpenWindowRequest::new("About", "about").with_id("about")),
        );

        assert_eq!(state.windows.len(), 2);
        assert_eq!(state.focused_window_id, Some(WindowId::new("about")));
    }

    #[test]
    fn explicit_geometry_is_kept_on_open() {
        let mut state = DesktopState::default();
        reduce(
            &mut state,
            DesktopAction::OpenWindow(
                OpenWindowRequest::new("Files", "files")
                    .with_position(Position::new(7, 9))
                    .with_size(Size::new(400, 300)),
            ),
        );
        let window = &state.windows[0];
        assert_eq!(window.position, Position::new(7, 9));
        assert_eq!(window.size, Size::new(400, 300));
    }

    #[test]
    fn focus_strictly_increases_counter() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");
        let b = open(&mut state, "B");

        for target in [&a, &a, &b] {
            let before = state.next_z_index;
            reduce(
                &mut state,
                DesktopAction::FocusWindow {
                    window_id: target.clone(),
                },
            );
            assert_eq!(state.next_z_index, before + 1);
            assert_eq!(state.window(target).unwrap().z_index, before);
        }
        let mut z: Vec<u32> = state.windows.iter().map(|w| w.z_index).collect();
        z.dedup();
        assert_eq!(z.len(), 2);
    }

    #[test]
    fn minimize_hands_focus_to_highest_visible_window() {
        let mut state = DesktopState::default();
        let b = open(&mut state, "B");
        let a = open(&mut state, "A");
        state.window_mut(&b).unwrap().z_index = 3;
        state.window_mut(&a).unwrap().z_index = 5;

        reduce(&mut state, DesktopAction::MinimizeWindow { window_id: a.clone() });

        assert_eq!(state.focused_window_id, Some(b.clone()));
        assert!(state.window(&b).unwrap().is_focused);
        let minimized = state.window(&a).unwrap();
        assert!(minimized.is_minimized && !minimized.is_focused);
    }

    #[test]
    fn minimizing_a_background_window_refocuses_the_topmost_visible_window() {
        let window = |id: &str, z_index: u32, is_focused: bool| WindowRecord {
            id: WindowId::new(id),
            title: id.to_string(),
            component_kind: "notes".to_string(),
            position: Position::new(10, 10),
            size: Size::new(300, 200),
            z_index,
            is_minimized: false,
            is_focused,
            payload: serde_json::Value::Null,
        };
        let mut state = DesktopState::default();
        reduce(
            &mut state,
            DesktopAction::Hydrate {
                restored: RestoredDesktop {
                    windows: Some(vec![
                        window("low", 110, true),
                        window("high", 120, false),
                        window("bottom", 105, false),
                    ]),
                    ..RestoredDesktop::default()
                },
            },
        );
        assert_eq!(state.focused_window_id, Some(WindowId::new("low")));

        reduce(
            &mut state,
            DesktopAction::MinimizeWindow {
                window_id: WindowId::new("bottom"),
            },
        );

        assert_eq!(state.focused_window_id, Some(WindowId::new("high")));
        assert_eq!(focused_count(&state), 1);
        assert!(state.window(&WindowId::new("high")).unwrap().is_focused);
    }

    #[test]
    fn set_window_rect_replaces_position_and_size_together() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");
        let z_before = state.window(&a).unwrap().z_index;
        let rect = Rect::new(Position::new(30, 40), Size::new(350, 260));

        let effects = reduce(
            &mut state,
            DesktopAction::SetWindowRect {
                window_id: a.clone(),
                rect,
            },
        );

        assert!(effects.is_empty());
        assert_eq!(state.window(&a).unwrap().rect(), rect);
        assert_eq!(state.window(&a).unwrap().z_index, z_before);
    }

    #[test]
    fn minimizing_every_window_clears_focus_and_keeps_geometry() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");
        let before = state.window(&a).unwrap().rect();

        reduce(&mut state, DesktopAction::MinimizeWindow { window_id: a.clone() });

        assert_eq!(state.focused_window_id, None);
        assert_eq!(focused_count(&state), 0);
        assert_eq!(state.window(&a).unwrap().rect(), before);
    }

    #[test]
    fn close_hands_focus_to_highest_remaining_z_index() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");
        let b = open(&mut state, "B");
        let c = open(&mut state, "C");
        state.window_mut(&a).unwrap().z_index = 5;
        state.window_mut(&b).unwrap().z_index = 7;
        state.window_mut(&c).unwrap().z_index = 2;
        reduce(&mut state, DesktopAction::FocusWindow { window_id: a.clone() });
        state.window_mut(&a).unwrap().z_index = 5;

        reduce(&mut state, DesktopAction::CloseWindow { window_id: a });

        assert_eq!(state.focused_window_id, Some(b.clone()));
        assert!(state.window(&b).unwrap().is_focused);
        assert!(!state.window(&c).unwrap().is_focused);
    }

    #[test]
    fn close_skips_minimized_windows_when_picking_successor() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");
        let b = open(&mut state, "B");
        reduce(&mut state, DesktopAction::MinimizeWindow { window_id: a.clone() });

        reduce(&mut state, DesktopAction::CloseWindow { window_id: b });

        assert_eq!(state.focused_window_id, None);
        assert!(state.window(&a).unwrap().is_minimized);
    }

    #[test]
    fn closing_unfocused_window_keeps_focus() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");
        let b = open(&mut state, "B");

        reduce(&mut state, DesktopAction::CloseWindow { window_id: a.clone() });

        assert_eq!(state.focused_window_id, Some(b));
        assert!(state.window(&a).is_none());
    }

    #[test]
    fn missing_window_is_reported_without_mutation() {
        let mut state = DesktopState::default();
        open(&mut state, "A");
        let before = state.clone();

        for action in [
            DesktopAction::CloseWindow {
                window_id: WindowId::new("ghost"),
            },
            DesktopAction::FocusWindow {
                window_id: WindowId::new("ghost"),
            },
            DesktopAction::MaximizeWindow {
                window_id: WindowId::new("ghost"),
            },
            DesktopAction::UpdateWindowSize {
                window_id: WindowId::new("ghost"),
                size: Size::new(1, 1),
            },
            DesktopAction::SetWindowRect {
                window_id: WindowId::new("ghost"),
                rect: Rect::new(Position::new(1, 1), Size::new(1, 1)),
            },
        ] {
            let err = reduce_desktop(&mut state, &DesktopConfig::default(), action).unwrap_err();
            assert_eq!(err, ReducerError::WindowNotFound(WindowId::new("ghost")));
        }
        assert_eq!(state, before);
    }

    #[test]
    fn restore_unminimizes_and_focuses() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");
        open(&mut state, "B");
        reduce(&mut state, DesktopAction::MinimizeWindow { window_id: a.clone() });

        reduce(&mut state, DesktopAction::RestoreWindow { window_id: a.clone() });

        let window = state.window(&a).unwrap();
        assert!(!window.is_minimized && window.is_focused);
        assert_eq!(window.z_index + 1, state.next_z_index);
    }

    #[test]
    fn maximize_fills_area_above_taskbar_without_touching_focus() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");
        let b = open(&mut state, "B");
        let z_before = state.window(&a).unwrap().z_index;

        reduce(&mut state, DesktopAction::MaximizeWindow { window_id: a.clone() });

        let window = state.window(&a).unwrap();
        assert_eq!(window.position, Position::ORIGIN);
        assert_eq!(window.size, Size::new(1280, 752));
        assert_eq!(window.z_index, z_before);
        assert_eq!(state.focused_window_id, Some(b));
    }

    #[test]
    fn center_uses_half_width_and_seventy_percent_height() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");
        reduce(
            &mut state,
            DesktopAction::UpdateDesktopSize {
                size: Size::new(1000, 748),
            },
        );

        reduce(&mut state, DesktopAction::CenterWindow { window_id: a.clone() });

        let window = state.window(&a).unwrap();
        assert_eq!(window.size, Size::new(500, 490));
        assert_eq!(window.position, Position::new(250, 40));
    }

    #[test]
    fn desktop_resize_does_not_reclamp_windows() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");
        reduce(
            &mut state,
            DesktopAction::UpdateWindowPosition {
                window_id: a.clone(),
                position: Position::new(900, 500),
            },
        );
        reduce(
            &mut state,
            DesktopAction::UpdateDesktopSize {
                size: Size::new(320, 240),
            },
        );
        assert_eq!(state.window(&a).unwrap().position, Position::new(900, 500));
    }

    #[test]
    fn taskbar_toggle_minimizes_if_focused_and_restores_if_minimized() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");

        reduce(&mut state, DesktopAction::ToggleTaskbarWindow { window_id: a.clone() });
        assert!(state.window(&a).unwrap().is_minimized);
        assert_eq!(state.focused_window_id, None);

        reduce(&mut state, DesktopAction::ToggleTaskbarWindow { window_id: a.clone() });
        let window = state.window(&a).unwrap();
        assert!(!window.is_minimized && window.is_focused);
    }

    #[test]
    fn taskbar_toggle_focuses_background_window() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");
        open(&mut state, "B");

        reduce(&mut state, DesktopAction::ToggleTaskbarWindow { window_id: a.clone() });
        assert_eq!(state.focused_window_id, Some(a));
    }

    #[test]
    fn cycle_focus_raises_bottom_visible_window() {
        let mut state = DesktopState::default();
        let a = open(&mut state, "A");
        let b = open(&mut state, "B");
        let c = open(&mut state, "C");
        reduce(&mut state, DesktopAction::MinimizeWindow { window_id: a });

        reduce(&mut state, DesktopAction::CycleFocus);
        assert_eq!(state.focused_window_id, Some(b.clone()));
        reduce(&mut state, DesktopAction::CycleFocus);
        assert_eq!(state.focused_window_id, Some(c));
    }

    #[test]
    fn theme_change_requests_immediate_persist() {
        let mut state = DesktopState::default();
        let effects = reduce(&mut state, DesktopAction::SetTheme { theme: Theme::Glass });
        assert_eq!(state.theme, Theme::Glass);
        assert_eq!(effects, vec![RuntimeEffect::PersistTheme]);
    }

    #[test]
    fn icon_commands_replace_layout_and_selection() {
        let mut state = DesktopState::default();
        reduce(
            &mut state,
            DesktopAction::SetIconPositions {
                positions: BTreeMap::from([
                    ("about".to_string(), Position::new(16, 16)),
                    ("terminal".to_string(), Position::new(16, 120)),
                ]),
            },
        );
        reduce(
            &mut state,
            DesktopAction::UpdateIconPosition {
                app_id: "terminal".to_string(),
                position: Position::new(200, 200),
            },
        );
        reduce(
            &mut state,
            DesktopAction::SetSelectedIcons {
                app_ids: BTreeSet::from(["about".to_string()]),
            },
        );

        assert_eq!(state.icon_positions["terminal"], Position::new(200, 200));
        assert_eq!(state.icon_positions["about"], Position::new(16, 16));
        assert!(state.selected_icon_ids.contains("about"));

        reduce(&mut state, DesktopAction::ClearSelectedIcons);
        assert!(state.selected_icon_ids.is_empty());
        assert!(state.windows.is_empty());
    }

    #[test]
    fn hydrate_applies_only_restored_fields() {
        let mut state = DesktopState::default();
        state.theme = Theme::Light;
        let restored_window = WindowRecord {
            id: WindowId::new("contact"),
            title: "Contact".to_string(),
            component_kind: "contact".to_string(),
            position: Position::new(120, 90),
            size: Size::new(400, 320),
            z_index: 140,
            is_minimized: false,
            is_focused: true,
            payload: serde_json::Value::Null,
        };

        reduce(
            &mut state,
            DesktopAction::Hydrate {
                restored: RestoredDesktop {
                    theme: None,
                    windows: Some(vec![restored_window.clone()]),
                    icon_positions: None,
                },
            },
        );

        assert_eq!(state.theme, Theme::Light);
        assert_eq!(state.windows, vec![restored_window]);
        assert_eq!(state.focused_window_id, Some(WindowId::new("contact")));
        assert_eq!(state.next_z_index, 141);
        assert!(state.window(&WindowId::new("contact")).is_some());
    }
}
