//! Pure geometry used by the window manager: clamping, edge snapping, resize anchoring, overlap,
//! and default placement.

use crate::config::CascadeConfig;
use crate::model::{PointerPosition, Position, Rect, ResizeHandle, Size};

/// Default pixel distance for [`snap_to_edge`].
pub const SNAP_EDGE_THRESHOLD: i32 = 20;

/// Area available to windows: the viewport minus the taskbar band.
pub fn desktop_bounds(viewport: Size, chrome_height: i32) -> Size {
    Size {
        width: viewport.width.max(0),
        height: viewport.height.saturating_sub(chrome_height).max(0),
    }
}

/// Clamps `pos` so a window of `size` stays inside `bounds`.
///
/// When `size` exceeds `bounds` on an axis the window is pinned to the origin side of that axis.
pub fn constrain_position(pos: Position, size: Size, bounds: Size) -> Position {
    let max_x = bounds.width.saturating_sub(size.width).max(0);
    let max_y = bounds.height.saturating_sub(size.height).max(0);
    Position {
        x: pos.x.max(0).min(max_x),
        y: pos.y.max(0).min(max_y),
    }
}

/// Pulls a window flush against any desktop edge it is within `threshold` px of.
///
/// Axes are independent. The left/top edge wins when both edges of an axis are in range.
pub fn snap_to_edge(pos: Position, size: Size, bounds: Size, threshold: i32) -> Position {
    Position {
        x: snap_axis(pos.x, bounds.width.saturating_sub(size.width), threshold),
        y: snap_axis(pos.y, bounds.height.saturating_sub(size.height), threshold),
    }
}

fn snap_axis(value: i32, far_edge: i32, threshold: i32) -> i32 {
    if value >= 0 && value < threshold {
        0
    } else if far_edge >= 0 && far_edge.saturating_sub(value).saturating_abs() < threshold {
        far_edge
    } else {
        value
    }
}

/// Clamps each dimension of `size` into `[min, max]`. `min` wins if the range is inverted.
pub fn constrain_size(size: Size, min_size: Size, max_size: Size) -> Size {
    Size {
        width: size.width.min(max_size.width).max(min_size.width),
        height: size.height.min(max_size.height).max(min_size.height),
    }
}

/// Computes the geometry for a resize gesture on `handle`.
///
/// West and north handles keep the opposite edge fixed: the window shrinks toward the anchored
/// east/south edge and stops at `min_size`. The result is not clamped to the desktop.
pub fn calculate_resize(
    handle: ResizeHandle,
    start_pointer: PointerPosition,
    current_pointer: PointerPosition,
    original: Rect,
    min_size: Size,
) -> Rect {
    let (dx, dy) = current_pointer.delta_from(start_pointer);
    let Rect {
        mut position,
        mut size,
    } = original;

    if handle.grows_east() {
        size.width = original.size.width.saturating_add(dx).max(min_size.width);
    }
    if handle.grows_west() {
        size.width = original.size.width.saturating_sub(dx).max(min_size.width);
        position.x = original
            .position
            .x
            .saturating_add(original.size.width.saturating_sub(size.width));
    }
    if handle.grows_south() {
        size.height = original.size.height.saturating_add(dy).max(min_size.height);
    }
    if handle.grows_north() {
        size.height = original.size.height.saturating_sub(dy).max(min_size.height);
        position.y = original
            .position
            .y
            .saturating_add(original.size.height.saturating_sub(size.height));
    }

    Rect { position, size }
}

/// Bounding-box intersection test. Rectangles that only touch along an edge count as overlapping.
pub fn is_overlapping(a: Rect, b: Rect) -> bool {
    !(a.right() < b.left() || a.left() > b.right() || a.bottom() < b.top() || a.top() > b.bottom())
}

/// Default position for the next window given how many are already open.
pub fn cascade_position(existing_count: usize, cascade: &CascadeConfig) -> Position {
    let modulus = i64::from(cascade.max.max(1));
    let offset = (existing_count as i64 * i64::from(cascade.step)).rem_euclid(modulus) as i32;
    cascade.base.offset(offset, offset)
}

/// Cell position of the `index`-th desktop icon, filling columns top to bottom.
pub fn icon_grid_position(index: usize, rows: usize, cell: Size, origin: Position) -> Position {
    let rows = rows.max(1);
    let column = (index / rows) as i32;
    let row = (index % rows) as i32;
    origin.offset(column.saturating_mul(cell.width), row.saturating_mul(cell.height))
}
