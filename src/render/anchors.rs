//! Fixed edge anchors on node rectangles.

use crate::model::Position;
use crate::settings::CanvasSettings;

use super::types::Rect;

/// Vertical gap between an edge's midpoint and its label baseline.
const LABEL_LIFT: f64 = 10.0;

/// Anchor point of an edge on a node. Source and target use the same fixed
/// offset from the node's top-left corner, so an edge never follows the
/// pointer.
pub fn anchor(rect: &Rect, canvas: &CanvasSettings) -> Position {
    Position::new(rect.x + canvas.anchor_x, rect.y + canvas.anchor_y)
}

/// Start and end points of a directed edge `from -> to`.
pub fn edge_endpoints(from: &Rect, to: &Rect, canvas: &CanvasSettings) -> (Position, Position) {
    (anchor(from, canvas), anchor(to, canvas))
}

pub fn label_position(from: Position, to: Position) -> Position {
    Position::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0 - LABEL_LIFT)
}
