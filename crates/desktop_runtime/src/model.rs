use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DesktopConfig;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub String);

impl WindowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a desktop application (icon key, e.g. `"terminal"`).
pub type AppId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub position: Position,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Position, size: Size) -> Self {
        Self { position, size }
    }

    pub fn left(&self) -> i32 {
        self.position.x
    }

    pub fn top(&self) -> i32 {
        self.position.y
    }

    pub fn right(&self) -> i32 {
        self.position.x.saturating_add(self.size.width)
    }

    pub fn bottom(&self) -> i32 {
        self.position.y.saturating_add(self.size.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Macos,
    Glass,
    Custom,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Dark,
        Theme::Light,
        Theme::Macos,
        Theme::Glass,
        Theme::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
            Self::Macos => "macos",
            Self::Glass => "glass",
            Self::Custom => "custom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|theme| theme.as_str() == name)
    }
}

/// One of the eight compass resize handles on a window border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    pub fn grows_east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    pub fn grows_west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    pub fn grows_south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    pub fn grows_north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    /// Parses the handle label used by the rendering layer (`"n"`, `"se"`, ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "n" => Some(Self::N),
            "s" => Some(Self::S),
            "e" => Some(Self::E),
            "w" => Some(Self::W),
            "ne" => Some(Self::Ne),
            "nw" => Some(Self::Nw),
            "se" => Some(Self::Se),
            "sw" => Some(Self::Sw),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRecord {
    pub id: WindowId,
    pub title: String,
    /// Placeholder app content tag, passed through untouched.
    pub component_kind: String,
    pub position: Position,
    pub size: Size,
    pub z_index: u32,
    pub is_minimized: bool,
    pub is_focused: bool,
    #[serde(default)]
    pub payload: Value,
}

impl WindowRecord {
    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenWindowRequest {
    pub id: Option<WindowId>,
    pub title: String,
    pub component_kind: String,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub payload: Value,
}

impl OpenWindowRequest {
    pub fn new(title: impl Into<String>, component_kind: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            component_kind: component_kind.into(),
            position: None,
            size: None,
            payload: Value::Null,
        }
    }

    pub fn with_id(mut self, id: impl Into<WindowId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesktopState {
    pub windows: Vec<WindowRecord>,
    pub next_z_index: u32,
    pub next_window_seq: u64,
    pub focused_window_id: Option<WindowId>,
    pub viewport_size: Size,
    pub theme: Theme,
    pub icon_positions: BTreeMap<AppId, Position>,
    pub selected_icon_ids: BTreeSet<AppId>,
    window_index: HashMap<WindowId, usize>,
}

impl DesktopState {
    pub fn new(config: &DesktopConfig) -> Self {
        Self {
            windows: Vec::new(),
            next_z_index: config.chrome_z_index + 1,
            next_window_seq: 1,
            focused_window_id: None,
            viewport_size: config.initial_viewport,
            theme: Theme::default(),
            icon_positions: BTreeMap::new(),
            selected_icon_ids: BTreeSet::new(),
            window_index: HashMap::new(),
        }
    }

    pub fn window(&self, window_id: &WindowId) -> Option<&WindowRecord> {
        self.window_index
            .get(window_id)
            .and_then(|idx| self.windows.get(*idx))
    }

    pub fn window_mut(&mut self, window_id: &WindowId) -> Option<&mut WindowRecord> {
        let idx = *self.window_index.get(window_id)?;
        self.windows.get_mut(idx)
    }

    pub fn contains_window(&self, window_id: &WindowId) -> bool {
        self.window_index.contains_key(window_id)
    }

    pub fn focused_window(&self) -> Option<&WindowRecord> {
        self.focused_window_id
            .as_ref()
            .and_then(|id| self.window(id))
    }

    /// Non-minimized windows from bottom to top of the stack.
    pub fn windows_in_stack_order(&self) -> Vec<&WindowRecord> {
        let mut visible: Vec<&WindowRecord> =
            self.windows.iter().filter(|w| !w.is_minimized).collect();
        visible.sort_by_key(|w| w.z_index);
        visible
    }

    /// Rebuilds the id lookup after windows were inserted, removed, or replaced.
    pub(crate) fn reindex(&mut self) {
        self.window_index = self
            .windows
            .iter()
            .enumerate()
            .map(|(idx, w)| (w.id.clone(), idx))
            .collect();
    }
}

impl Default for DesktopState {
    fn default() -> Self {
        Self::new(&DesktopConfig::default())
    }
}

/// Durable projection of [`DesktopState`]: the only fields that survive a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDesktop {
    pub theme: Theme,
    pub windows: Vec<WindowRecord>,
    pub icon_positions: Vec<(AppId, Position)>,
}

impl PersistedDesktop {
    pub fn from_state(state: &DesktopState) -> Self {
        Self {
            theme: state.theme,
            windows: state.windows.clone(),
            icon_positions: state
                .icon_positions
                .iter()
                .map(|(app_id, position)| (app_id.clone(), *position))
                .collect(),
        }
    }
}

/// Persisted fields that passed validation; `None` means "keep the in-memory default".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RestoredDesktop {
    pub theme: Option<Theme>,
    pub windows: Option<Vec<WindowRecord>>,
    pub icon_positions: Option<BTreeMap<AppId, Position>>,
}

impl RestoredDesktop {
    pub fn is_empty(&self) -> bool {
        self.theme.is_none() && self.windows.is_none() && self.icon_positions.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

impl PointerPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn delta_from(self, start: PointerPosition) -> (i32, i32) {
        (self.x.saturating_sub(start.x), self.y.saturating_sub(start.y))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub window_id: WindowId,
    pub pointer_start: PointerPosition,
    pub position_start: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSession {
    pub window_id: WindowId,
    pub handle: ResizeHandle,
    pub pointer_start: PointerPosition,
    pub rect_start: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub dragging: Option<DragSession>,
    pub resizing: Option<ResizeSession>,
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        self.dragging.is_none() && self.resizing.is_none()
    }
}

/// Pointer input forwarded by the rendering layer, in viewport coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerInput {
    Down {
        window_id: WindowId,
        handle: Option<ResizeHandle>,
        pointer: PointerPosition,
    },
    Move {
        pointer: PointerPosition,
    },
    Up {
        pointer: PointerPosition,
    },
    Cancel,
}
